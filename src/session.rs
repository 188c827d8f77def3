//! Session state machine.
//!
//! One session holds at most one uploaded image and the latest results for
//! it. The controller drives the orchestrator and records where it is:
//!
//! ```text
//!            upload                         fix_with_manual_crop
//!   Idle ───────────▶ Analyzing ──▶ Fixing ──▶ Done ◀──────┐
//!    ▲                    │            │        │          │
//!    │                    └──▶ Error ◀─┘        └──────────┘
//!    └──────── reset (from any state) ──────────┘
//! ```
//!
//! Work runs outside the lock. Every operation takes a generation
//! [`Ticket`] when it starts and commits only if no newer operation (or
//! reset) began in the meantime, so the last-initiated operation always
//! wins and late results are dropped.

use crate::config::{FixerConfig, UploadConfig};
use crate::imaging::{CropRect, DecodedImage, Encoder};
use crate::pipeline::{FixOutcome, PipelineError, fix_image, fix_image_with_crop_area, load_and_analyze};
use crate::platforms::TargetSpec;
use crate::types::{AnalysisResult, ImageFormat};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

const ACCEPTED_MIME: [&str; 2] = ["image/jpeg", "image/png"];

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("unsupported file type '{0}': only JPG and PNG are accepted")]
    UnsupportedFormat(String),
    #[error("file is too large ({size} bytes, limit {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("no image loaded")]
    NoImage,
}

/// Check an upload's type and size before any decoding.
pub fn validate_upload(
    size_bytes: u64,
    mime: &str,
    config: &UploadConfig,
) -> Result<ImageFormat, UploadError> {
    let mime = mime.trim().to_ascii_lowercase();
    if !ACCEPTED_MIME.contains(&mime.as_str()) {
        return Err(UploadError::UnsupportedFormat(mime));
    }
    let limit = config.max_size_bytes();
    if size_bytes > limit {
        return Err(UploadError::TooLarge {
            size: size_bytes,
            limit,
        });
    }
    Ok(ImageFormat::from_mime(&mime))
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Analyzing,
    Fixing,
    Done,
    /// Failure message for the user; cleared by the next operation.
    Error(String),
}

/// Generation stamp of one operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Default)]
struct Session {
    state: SessionState,
    image: Option<Arc<DecodedImage>>,
    analysis: Option<AnalysisResult>,
    outcome: Option<FixOutcome>,
    generation: u64,
}

impl Session {
    fn begin(&mut self, state: SessionState) -> Ticket {
        self.generation += 1;
        self.state = state;
        Ticket(self.generation)
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.generation
    }
}

/// Drives uploads and fixes for one user session.
pub struct SessionController<E> {
    encoder: E,
    config: FixerConfig,
    session: Mutex<Session>,
}

impl<E: Encoder> SessionController<E> {
    pub fn new(encoder: E, config: FixerConfig) -> Self {
        Self {
            encoder,
            config,
            session: Mutex::new(Session::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `commit` only if `ticket` is still the latest operation.
    fn commit(&self, ticket: Ticket, commit: impl FnOnce(&mut Session)) -> bool {
        let mut session = self.lock();
        if !session.is_current(ticket) {
            log::warn!("discarding stale result of operation {}", ticket.0);
            return false;
        }
        commit(&mut session);
        true
    }

    fn fail(&self, ticket: Ticket, err: SessionError) -> Result<bool, SessionError> {
        self.commit(ticket, |s| s.state = SessionState::Error(err.to_string()));
        Err(err)
    }

    /// Upload, analyze, and auto-fix in one go.
    ///
    /// Rejected uploads leave the session untouched. Returns `Ok(false)` when
    /// a newer operation superseded this one and its results were dropped.
    pub fn upload(&self, bytes: &[u8], mime: &str, spec: &TargetSpec) -> Result<bool, SessionError> {
        validate_upload(bytes.len() as u64, mime, &self.config.upload)?;

        let ticket = {
            let mut session = self.lock();
            session.image = None;
            session.analysis = None;
            session.outcome = None;
            session.begin(SessionState::Analyzing)
        };

        let (image, analysis) = match load_and_analyze(bytes, mime, spec, &self.config) {
            Ok(loaded) => loaded,
            Err(err) => return self.fail(ticket, err.into()),
        };
        let image = Arc::new(image);

        let current = self.commit(ticket, |s| {
            s.image = Some(Arc::clone(&image));
            s.analysis = Some(analysis.clone());
            s.state = SessionState::Fixing;
        });
        if !current {
            return Ok(false);
        }

        match fix_image(&self.encoder, &image, spec, &analysis, &self.config) {
            Ok(outcome) => Ok(self.commit(ticket, |s| {
                s.outcome = Some(outcome);
                s.state = SessionState::Done;
            })),
            Err(err) => self.fail(ticket, err.into()),
        }
    }

    /// Re-fix the loaded image with a user-chosen crop, skipping analysis.
    pub fn fix_with_manual_crop(&self, spec: &TargetSpec, crop: CropRect) -> Result<bool, SessionError> {
        let (image, ticket) = {
            let mut session = self.lock();
            let image = session.image.clone().ok_or(SessionError::NoImage)?;
            (image, session.begin(SessionState::Fixing))
        };

        match fix_image_with_crop_area(&self.encoder, &image, spec, crop, &self.config) {
            Ok(outcome) => Ok(self.commit(ticket, |s| {
                s.outcome = Some(outcome);
                s.state = SessionState::Done;
            })),
            Err(err) => self.fail(ticket, err.into()),
        }
    }

    /// Return to `Idle`, dropping the image and all results. In-flight
    /// operations will find their ticket stale.
    pub fn reset(&self) {
        let mut session = self.lock();
        let generation = session.generation + 1;
        *session = Session {
            generation,
            ..Session::default()
        };
    }

    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    pub fn image(&self) -> Option<Arc<DecodedImage>> {
        self.lock().image.clone()
    }

    pub fn analysis(&self) -> Option<AnalysisResult> {
        self.lock().analysis.clone()
    }

    pub fn outcome(&self) -> Option<FixOutcome> {
        self.lock().outcome.clone()
    }
}
