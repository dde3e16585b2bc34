use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

/// Errors that end a drill session.
#[derive(Debug, thiserror::Error)]
pub enum DrillError {
    #[error("cannot read word lists from {}: {source}", .path.display())]
    ListsDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("need at least {needed} words; found {found} in {}", .dir.display())]
    InsufficientWords {
        needed: usize,
        found: usize,
        dir: PathBuf,
    },

    #[error("stdin must be a tty")]
    NotInteractive,

    #[error("interrupted")]
    Interrupted,

    #[error("terminal error: {0}")]
    Io(#[from] io::Error),
}

impl DrillError {
    /// Setup failures happen before the first round and exit non-zero.
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            DrillError::ListsDir { .. }
                | DrillError::InsufficientWords { .. }
                | DrillError::NotInteractive
        )
    }
}

/// Speech failures. These never escape `SpeechOutput`.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("native speech engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("native speech engine failed: {0}")]
    Engine(String),

    #[error("failed to run `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` exited with {status}")]
    Exit { program: String, status: ExitStatus },

    #[error("no speech command available")]
    NoFallback,
}
