//! View controller.
//!
//! Owns the bound camera surface, the busy flag and the current result, and
//! drives the capture and upload flows. Requests run as spawned tasks and
//! report back over a channel, so all state changes happen on the task that
//! owns the controller.
use std::{fmt, future::Future, path::PathBuf};

use bytes::Bytes;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt},
    sync::mpsc,
    task::JoinHandle,
};

use crate::{
    capture,
    client::{DetectionClient, DetectionResponse},
    command::{Command, HELP},
    intake,
    presenter::Presenter,
    sensors::VideoSurface,
    Error,
};

/// Monotonic id of an issued detection request.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to the image returned by a detection.
#[derive(Debug)]
pub struct ResultImage {
    pub id: RequestId,
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ViewState {
    pub busy: bool,
    pub has_result: bool,
}

/// Why a capture or upload did not issue a request.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Ignored {
    Busy,
    NoCamera,
    NoFrame,
    NoFile,
}

impl fmt::Display for Ignored {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Ignored::Busy => "Capture is disabled while a detection is running",
            Ignored::NoCamera => "Camera is not started",
            Ignored::NoFrame => "Camera has no frame to capture",
            Ignored::NoFile => "No file selected",
        };
        f.write_str(reason)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Submission {
    Issued(RequestId),
    Ignored(Ignored),
}

/// What applying a finished request did to the view.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Outcome {
    Displayed(RequestId),
    /// The alert that was shown.
    Failed(String),
    /// Superseded by a later request and discarded.
    Stale(RequestId),
}

/// A finished request, as reported by its task.
#[derive(Debug)]
pub struct Completion {
    pub id: RequestId,
    pub outcome: Result<DetectionResponse, Error>,
}

pub struct ViewController<P> {
    client: DetectionClient,
    presenter: P,
    surface: Option<Box<dyn VideoSurface>>,
    busy: bool,
    result: Option<ResultImage>,
    next_id: u64,
    in_flight: Option<(RequestId, JoinHandle<()>)>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl<P: Presenter> ViewController<P> {
    pub fn new(client: DetectionClient, presenter: P) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            client,
            presenter,
            surface: None,
            busy: false,
            result: None,
            next_id: 1,
            in_flight: None,
            completions_tx,
            completions_rx,
        }
    }

    pub fn state(&self) -> ViewState {
        ViewState {
            busy: self.busy,
            has_result: self.result.is_some(),
        }
    }

    pub fn result(&self) -> Option<&ResultImage> {
        self.result.as_ref()
    }

    pub fn has_camera(&self) -> bool {
        self.surface.is_some()
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// Acquire a camera and bind it as the live surface.
    ///
    /// On failure the user is alerted and any previously bound surface stays.
    pub fn start_camera<F, S>(&mut self, acquire: F) -> bool
    where
        F: FnOnce() -> Result<S, Error>,
        S: VideoSurface + 'static,
    {
        match acquire() {
            Ok(surface) => {
                log::info!("Camera bound at {:?}", surface.dimensions());
                self.surface = Some(Box::new(surface));
                self.presenter.notice("Camera started");
                true
            }
            Err(err) => {
                log::warn!("Unable to access camera: {}", err);
                self.presenter
                    .alert(&format!("Unable to access camera: {err}"));
                false
            }
        }
    }

    /// Snapshot the live surface and send it for detection.
    pub fn capture_and_detect(&mut self) -> Submission {
        if self.busy {
            return self.ignore(Ignored::Busy);
        }
        let Some(surface) = self.surface.as_deref() else {
            return self.ignore(Ignored::NoCamera);
        };
        let Some(snapshot) = capture::take_snapshot(surface) else {
            return self.ignore(Ignored::NoFrame);
        };

        let client = self.client.clone();
        let id = self.issue(async move {
            let blob = capture::encode_jpeg(snapshot).await?;
            client.detect(blob).await
        });
        Submission::Issued(id)
    }

    /// Send the first selected file for detection.
    ///
    /// Uploads are not held back by the busy flag; a new upload supersedes
    /// whatever request is in flight.
    pub fn upload_file(&mut self, selection: &[PathBuf]) -> Submission {
        let Some(path) = intake::first_selected(selection) else {
            return self.ignore(Ignored::NoFile);
        };

        let path = path.to_owned();
        let client = self.client.clone();
        let id = self.issue(async move {
            let blob = intake::read_file(&path).await?;
            client.detect(blob).await
        });
        Submission::Issued(id)
    }

    /// Wait for the next finished request and apply it.
    pub async fn next_completion(&mut self) -> Option<Outcome> {
        let completion = self.completions_rx.recv().await?;
        Some(self.handle_completion(completion))
    }

    /// Apply a finished request to the view.
    ///
    /// Results of requests other than the current one are dropped. For the
    /// current one the busy flag is cleared whether it succeeded or not.
    pub fn handle_completion(&mut self, completion: Completion) -> Outcome {
        let Completion { id, outcome } = completion;

        if self.in_flight.as_ref().map(|(current, _)| *current) != Some(id) {
            log::debug!("Discarding stale result of request {}", id);
            return Outcome::Stale(id);
        }
        self.in_flight = None;

        let outcome = match outcome.and_then(|response| self.display(id, response)) {
            Ok(()) => Outcome::Displayed(id),
            Err(err) => {
                log::warn!("Request {} failed: {}", id, err);
                let message = format!("Error: {err}");
                self.presenter.alert(&message);
                Outcome::Failed(message)
            }
        };

        self.set_busy(false);
        outcome
    }

    /// Process commands from `input` until it ends or `quit` is given.
    pub async fn run<R, F, S>(&mut self, input: R, mut acquire: F) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        F: FnMut() -> Result<S, Error>,
        S: VideoSurface + 'static,
    {
        self.presenter.notice(HELP);
        let mut lines = input.lines();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    match line.parse::<Command>() {
                        Ok(Command::Quit) => break,
                        Ok(command) => self.dispatch(command, &mut acquire),
                        Err(err) => {
                            self.presenter.alert(&err.to_string());
                            self.presenter.notice(HELP);
                        }
                    }
                }
                Some(completion) = self.completions_rx.recv() => {
                    self.handle_completion(completion);
                }
            }
        }

        if let Some((id, handle)) = self.in_flight.take() {
            log::info!("Abandoning request {}", id);
            handle.abort();
        }
        Ok(())
    }

    fn dispatch<F, S>(&mut self, command: Command, acquire: &mut F)
    where
        F: FnMut() -> Result<S, Error>,
        S: VideoSurface + 'static,
    {
        match command {
            Command::StartCamera => {
                self.start_camera(acquire);
            }
            Command::Capture => {
                self.capture_and_detect();
            }
            Command::Upload(selection) => {
                self.upload_file(&selection);
            }
            Command::Status => {
                let state = self.state();
                let camera = if self.has_camera() { "on" } else { "off" };
                let result = match &self.result {
                    Some(result) => format!("request {}", result.id),
                    None => "none".to_owned(),
                };
                self.presenter.notice(&format!(
                    "camera: {camera}, busy: {}, result: {result}, endpoint: {}",
                    state.busy,
                    self.client.endpoint()
                ));
            }
            Command::Help => self.presenter.notice(HELP),
            Command::Quit => {}
        }
    }

    fn ignore(&mut self, reason: Ignored) -> Submission {
        log::debug!("Nothing to submit: {}", reason);
        self.presenter.notice(&reason.to_string());
        Submission::Ignored(reason)
    }

    /// Spawn a request, superseding the one in flight.
    fn issue<F>(&mut self, request: F) -> RequestId
    where
        F: Future<Output = Result<DetectionResponse, Error>> + Send + 'static,
    {
        let id = RequestId(self.next_id);
        self.next_id += 1;

        if let Some((previous, handle)) = self.in_flight.take() {
            log::info!("Request {} superseded by {}", previous, id);
            handle.abort();
        }

        let completions_tx = self.completions_tx.clone();
        let handle = tokio::spawn(async move {
            let outcome = request.await;
            if completions_tx.send(Completion { id, outcome }).is_err() {
                log::debug!("Controller gone, dropping result of request {}", id);
            }
        });

        log::debug!("Issued request {}", id);
        self.in_flight = Some((id, handle));
        self.set_busy(true);
        id
    }

    fn display(&mut self, id: RequestId, response: DetectionResponse) -> Result<(), Error> {
        let result = ResultImage {
            id,
            bytes: response.bytes,
            content_type: response.content_type,
        };
        self.presenter.show_result(&result)?;

        if let Some(previous) = self.result.replace(result) {
            log::debug!("Released result of request {}", previous.id);
        }
        Ok(())
    }

    fn set_busy(&mut self, busy: bool) {
        if self.busy != busy {
            self.busy = busy;
            self.presenter.set_busy(busy);
        }
    }
}
