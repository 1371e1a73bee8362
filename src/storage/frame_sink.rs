use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use crate::models::error::CaptureError;

/// Produces the path for a sink, evaluated at most once, on first use.
pub type PathProvider = Box<dyn FnOnce() -> PathBuf + Send>;

enum SinkState {
    /// Not requested for this session.
    Disabled,
    /// Requested; the file opens on the first frame that needs it.
    Unopened(PathProvider),
    Open(File),
    /// Open or write failed; the sink stays unusable for the session.
    Failed,
}

/// A lazily-opened append-mode byte sink for one stream of frames.
///
/// The file is only created once data exists to write: the path provider
/// runs on the first `append`, parent directories are created, and the file
/// opens in create+append mode — a later session reusing the same path
/// appends rather than truncating. Every write is flushed (durability over
/// throughput; these are debug streams).
///
/// IO failure latches the sink into `Failed`: the triggering frame is
/// dropped and no reopen is attempted for the rest of the session. Errors
/// are logged, never propagated to the capture loop.
pub struct FrameSink {
    state: SinkState,
}

impl FrameSink {
    pub fn disabled() -> Self {
        Self {
            state: SinkState::Disabled,
        }
    }

    pub fn unopened(provider: PathProvider) -> Self {
        Self {
            state: SinkState::Unopened(provider),
        }
    }

    /// Whether a path provider was supplied for this session.
    pub fn is_requested(&self) -> bool {
        !matches!(self.state, SinkState::Disabled)
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, SinkState::Open(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, SinkState::Failed)
    }

    /// Append one frame, opening the file first if this is the sink's first
    /// frame. No-op when disabled, closed, or failed.
    pub fn append(&mut self, bytes: &[u8]) {
        self.state = match std::mem::replace(&mut self.state, SinkState::Failed) {
            SinkState::Unopened(provider) => match open_for_append(provider()) {
                Ok(file) => SinkState::Open(file),
                Err(e) => {
                    log::error!("sink open failed, dropping sink for this session: {e}");
                    SinkState::Failed
                }
            },
            other => other,
        };

        if let SinkState::Open(ref mut file) = self.state {
            let result = file.write_all(bytes).and_then(|_| file.flush());
            if let Err(e) = result {
                log::error!("sink write failed, dropping sink for this session: {e}");
                self.state = SinkState::Failed;
            }
        }
    }

    /// Close the sink. Idempotent; the sink delivers nothing afterwards.
    pub fn close(&mut self) {
        if let SinkState::Open(ref mut file) = self.state {
            if let Err(e) = file.flush() {
                log::error!("sink flush on close failed: {e}");
            }
        }
        self.state = SinkState::Disabled;
    }
}

fn open_for_append(path: PathBuf) -> Result<File, CaptureError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| CaptureError::Storage(format!("failed to create directory: {e}")))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| CaptureError::Storage(format!("failed to open {}: {e}", path.display())))
}
