//! Session management
//!
//! A session is one run of an executable. It owns a directory under
//! `$BOT_SW_ROOT/<sessions_dir>` holding everything the run writes (the log
//! file, telemetry), and sets the epoch all log and telemetry timestamps are
//! relative to.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use chrono::{DateTime, Utc};
use conquer_once::OnceCell;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Internal imports
use crate::time;

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

static SESSION_EPOCH: OnceCell<DateTime<Utc>> = OnceCell::uninit();

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Format of the timestamp in session directory names.
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The current session.
#[derive(Clone, Debug)]
pub struct Session {
    /// Name of the executable which started the session
    pub exec_name: String,

    /// Time the session started
    pub epoch: DateTime<Utc>,

    /// The root directory for this session
    pub session_root: PathBuf,

    /// The path to the session's log file
    pub log_file_path: PathBuf,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors associated with the session module.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("The software root environment variable (BOT_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot create the session directory: {0}")]
    CannotCreateDir(std::io::Error),

    #[error("A session has already been started in this process")]
    AlreadyStarted,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Session {
    /// Start the session for this process.
    ///
    /// Creates `$BOT_SW_ROOT/{sessions_dir}/{exec_name}_{timestamp}`. Only one session may be
    /// started per process.
    pub fn new(exec_name: &str, sessions_dir: &str) -> Result<Self, SessionError> {
        let mut sessions_root =
            crate::host::get_bot_sw_root().map_err(|_| SessionError::SwRootNotSet)?;
        sessions_root.push(sessions_dir);

        let now = Utc::now();
        SESSION_EPOCH
            .try_init_once(|| now)
            .map_err(|_| SessionError::AlreadyStarted)?;

        Self::in_dir(&sessions_root, exec_name, now)
    }

    /// Create the session directory for the given epoch under `sessions_root`.
    fn in_dir(
        sessions_root: &Path,
        exec_name: &str,
        epoch: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        let session_root = sessions_root.join(session_dir_name(exec_name, &epoch));

        fs::create_dir_all(&session_root).map_err(SessionError::CannotCreateDir)?;

        Ok(Session {
            exec_name: String::from(exec_name),
            epoch,
            log_file_path: session_root.join(format!("{}.log", exec_name)),
            session_root,
        })
    }

    /// Path of a file in the session directory.
    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.session_root.join(file_name)
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the number of seconds elapsed since the start of the session.
///
/// Returns `NAN` if no session has been started, so that logging from tests
/// or tools without a session doesn't panic.
pub fn get_elapsed_seconds() -> f64 {
    match SESSION_EPOCH.get() {
        Some(e) => time::duration_to_seconds(Utc::now() - *e).unwrap_or(std::f64::NAN),
        None => std::f64::NAN,
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn session_dir_name(exec_name: &str, epoch: &DateTime<Utc>) -> String {
    format!("{}_{}", exec_name, epoch.format(TIMESTAMP_FORMAT))
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_session_dir() {
        let epoch = Utc.ymd(2022, 11, 5).and_hms(14, 3, 9);
        assert_eq!(session_dir_name("bot_exec", &epoch), "bot_exec_20221105_140309");

        let root = std::env::temp_dir().join(format!("bot_sw_session_test_{}", std::process::id()));
        let session = Session::in_dir(&root, "bot_exec", epoch).unwrap();

        assert!(session.session_root.is_dir());
        assert_eq!(
            session.log_file_path,
            root.join("bot_exec_20221105_140309").join("bot_exec.log")
        );
        assert_eq!(
            session.path_for("tm.jsonl"),
            root.join("bot_exec_20221105_140309").join("tm.jsonl")
        );

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_elapsed_without_session() {
        // No test starts a session, so the epoch is never set
        assert!(get_elapsed_seconds().is_nan());
    }
}
