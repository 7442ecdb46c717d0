//! # Telemetry logger
//!
//! Telemetry sink used by the executable. Values put during a cycle are collected into a frame,
//! and on flush the frame is logged at debug level and appended as one line of JSON to the
//! session's telemetry file.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use std::{
    fs::File,
    io::{BufWriter, Write},
};

// Internal
use bot_if::tm::Telemetry;
use util::session::{self, Session};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Name of the telemetry file in the session directory.
pub const TM_FILE_NAME: &str = "tm.jsonl";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Logs telemetry frames.
pub struct TmLogger<W: Write> {
    out: W,

    /// Values put since the last flush
    values: Map<String, Value>,

    num_frames: u64,

    /// Set once a write has failed, after which frames are only logged
    write_failed: bool,
}

/// A single line of the telemetry file.
#[derive(Serialize)]
struct TmFrame<'a> {
    frame: u64,
    session_time_s: f64,
    values: &'a Map<String, Value>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TmLoggerError {
    #[error("Could not create the telemetry file: {0}")]
    CreateError(std::io::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl TmLogger<BufWriter<File>> {
    /// Create a logger writing to the telemetry file of the given session.
    pub fn create(session: &Session) -> Result<Self, TmLoggerError> {
        let path = session.path_for(TM_FILE_NAME);
        let file = File::create(&path).map_err(TmLoggerError::CreateError)?;

        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> TmLogger<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            values: Map::new(),
            num_frames: 0,
            write_failed: false,
        }
    }

    /// Number of frames flushed so far.
    pub fn num_frames(&self) -> u64 {
        self.num_frames
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_frame(&mut self, line: &str) -> std::io::Result<()> {
        writeln!(self.out, "{}", line)?;
        self.out.flush()
    }
}

impl<W: Write> Telemetry for TmLogger<W> {
    fn put(&mut self, key: &str, value: String) {
        self.values.insert(String::from(key), Value::String(value));
    }

    fn flush(&mut self) {
        if self.values.is_empty() {
            return;
        }

        let frame = TmFrame {
            frame: self.num_frames,
            session_time_s: session::get_elapsed_seconds(),
            values: &self.values,
        };

        let line = match serde_json::to_string(&frame) {
            Ok(l) => l,
            Err(e) => {
                warn!("Could not serialize telemetry frame {}: {}", self.num_frames, e);
                self.values.clear();
                return;
            }
        };

        debug!("TM {}", line);

        if !self.write_failed {
            if let Err(e) = self.write_frame(&line) {
                warn!("Could not write telemetry, further frames will only be logged: {}", e);
                self.write_failed = true;
            }
        }

        self.num_frames += 1;
        self.values.clear();
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
