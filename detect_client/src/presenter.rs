//! Presentation of the controller state to the user.
//!
use std::path::{Path, PathBuf};

use crate::{controller::ResultImage, Error};

/// Everything the view controller shows to the user goes through here.
pub trait Presenter {
    /// Busy indicator, shown while a detection is in flight.
    fn set_busy(&mut self, busy: bool);

    /// Display a detection result, replacing the previous one.
    fn show_result(&mut self, result: &ResultImage) -> Result<(), Error>;

    /// Blocking, user-facing error message.
    fn alert(&mut self, message: &str);

    /// Informational message.
    fn notice(&mut self, message: &str);
}

/// Presents on the terminal, results are written to an image file.
pub struct TerminalPresenter {
    output: PathBuf,
}

impl TerminalPresenter {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

impl Presenter for TerminalPresenter {
    fn set_busy(&mut self, busy: bool) {
        if busy {
            println!("Detecting...");
        }
    }

    fn show_result(&mut self, result: &ResultImage) -> Result<(), Error> {
        std::fs::write(&self.output, &result.bytes).map_err(|source| Error::Output {
            path: self.output.clone(),
            source,
        })?;

        println!(
            "Detection result {} written to {} ({} bytes, {})",
            result.id,
            self.output.display(),
            result.bytes.len(),
            describe_content_type(result)
        );
        Ok(())
    }

    fn alert(&mut self, message: &str) {
        eprintln!("{message}");
    }

    fn notice(&mut self, message: &str) {
        println!("{message}");
    }
}

/// The declared type is only reported, the bytes are written regardless.
fn describe_content_type(result: &ResultImage) -> &str {
    result
        .content_type
        .as_deref()
        .unwrap_or("no content type declared")
}

#[cfg(test)]
mod test {

    use super::*;
    use crate::controller::RequestId;

    #[test]
    fn test_result_is_written_to_output() -> Result<(), Error> {
        let dir = std::env::temp_dir()
            .join("detect_client-presenter")
            .join(std::process::id().to_string());
        std::fs::create_dir_all(&dir).expect("create scratch dir");
        let output = dir.join("result.jpg");

        let mut presenter = TerminalPresenter::new(&output);
        presenter.show_result(&ResultImage {
            id: RequestId(1),
            bytes: vec![0xFF_u8, 0xD8, 0xFF, 0xE0].into(),
            content_type: Some("image/jpeg".to_owned()),
        })?;
        presenter.show_result(&ResultImage {
            id: RequestId(2),
            bytes: vec![0xFF_u8, 0xD8].into(),
            content_type: None,
        })?;

        assert_eq!(std::fs::read(&output).expect("read result"), vec![0xFF, 0xD8]);
        Ok(())
    }

    #[test]
    fn test_declared_content_type_is_described() {
        let result = |content_type: Option<&str>| ResultImage {
            id: RequestId(1),
            bytes: vec![0xFF_u8].into(),
            content_type: content_type.map(str::to_owned),
        };

        assert_eq!(
            describe_content_type(&result(Some("image/jpeg"))),
            "image/jpeg"
        );
        assert_eq!(
            describe_content_type(&result(None)),
            "no content type declared"
        );
    }

    #[test]
    fn test_unwritable_output_is_reported() {
        let mut presenter = TerminalPresenter::new("/nonexistent/dir/result.jpg");

        let result = presenter.show_result(&ResultImage {
            id: RequestId(1),
            bytes: vec![0xFF_u8].into(),
            content_type: None,
        });

        assert!(matches!(result, Err(Error::Output { .. })));
    }
}
