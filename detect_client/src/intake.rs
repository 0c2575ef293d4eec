//! File intake: user-selected images as an alternative to the camera.
//!
use std::path::{Path, PathBuf};

use common::blob::ImageBlob;

use crate::Error;

/// The file an upload acts on, the first of the selection.
pub fn first_selected(selection: &[PathBuf]) -> Option<&Path> {
    selection.first().map(PathBuf::as_path)
}

/// Read a file as is into a blob. The bytes are never re-encoded.
pub async fn read_file(path: &Path) -> Result<ImageBlob, Error> {
    let data = tokio::fs::read(path).await.map_err(|source| Error::Intake {
        path: path.to_owned(),
        source,
    })?;

    let blob = ImageBlob::from_file(path, data);
    log::debug!(
        "Read {:?} as {} ({} bytes)",
        path,
        &blob.mime,
        blob.len()
    );
    Ok(blob)
}

/// Read the first selected file, `None` when nothing is selected.
pub async fn read_selection(selection: &[PathBuf]) -> Result<Option<ImageBlob>, Error> {
    match first_selected(selection) {
        Some(path) => read_file(path).await.map(Some),
        None => Ok(None),
    }
}
