//! Hand-landmark detector session (MediaPipe helper subprocess).
//!
//! The helper owns the camera and streams one JSON line per frame:
//!
//! ```text
//! READY
//! {"width":1280,"height":720,"hands":[{"score":0.93,"handedness":"Right",
//!  "landmarks":[{"x":0.41,"y":0.52,"z":-0.01}, ... 21 entries ]}],"error":null}
//! ```
//!
//! Spawn failure is fatal at startup; a closed stream ends the session; a
//! malformed line degrades to "no hands" for that frame.

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};

use log::warn;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    #[error("detector script not found: {0}")]
    ScriptMissing(PathBuf),

    #[error("failed to spawn detector '{cmd}': {source}")]
    Spawn {
        cmd: String,
        source: std::io::Error,
    },

    #[error("detector did not signal READY, got: '{0}'")]
    NotReady(String),

    #[error("detector stream closed")]
    StreamClosed,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hand {
    #[serde(default)]
    pub score: f32,
    #[serde(default)]
    pub handedness: String,
    pub landmarks: Vec<Landmark>,
}

/// One camera frame's worth of detections. The helper owns the camera, so
/// the frame's pixel dimensions ride along on every line.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectorFrame {
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub hands: Vec<Hand>,
    #[serde(default)]
    pub error: Option<String>,
}

impl DetectorFrame {
    pub fn empty() -> Self {
        Self {
            width: 0.0,
            height: 0.0,
            hands: Vec::new(),
            error: None,
        }
    }
}

pub(crate) fn parse_frame(line: &str) -> serde_json::Result<DetectorFrame> {
    serde_json::from_str(line)
}

/// Scoped detector session: spawned once at startup, killed on drop.
pub struct HandDetector {
    child: Child,
    stdout: BufReader<ChildStdout>,
    line: String,
    last_size: (f32, f32),
}

impl HandDetector {
    pub fn spawn(command: &str, script: &Path) -> Result<Self, DetectorError> {
        if !script.exists() {
            return Err(DetectorError::ScriptMissing(script.to_path_buf()));
        }

        let mut child = Command::new(command)
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| DetectorError::Spawn {
                cmd: command.to_string(),
                source,
            })?;

        // stdout is piped above, so take() cannot return None
        let stdout = child.stdout.take().ok_or(DetectorError::StreamClosed)?;
        let mut stdout = BufReader::new(stdout);

        let mut ready = String::new();
        stdout.read_line(&mut ready)?;
        if ready.trim() != "READY" {
            let _ = child.kill();
            return Err(DetectorError::NotReady(ready.trim().to_string()));
        }
        log::info!("hand detector ready ({command} {})", script.display());

        Ok(Self {
            child,
            stdout,
            line: String::new(),
            last_size: (0.0, 0.0),
        })
    }

    /// Block for the next camera frame. This read paces the session loop at
    /// camera rate. A malformed line or a reported detector error counts as
    /// a frame with no hands.
    pub fn next_frame(&mut self) -> Result<DetectorFrame, DetectorError> {
        self.line.clear();
        let n = self.stdout.read_line(&mut self.line)?;
        if n == 0 {
            return Err(DetectorError::StreamClosed);
        }

        let mut frame = match parse_frame(&self.line) {
            Ok(f) => f,
            Err(e) => {
                warn!("unparseable detector line: {e}");
                let mut f = DetectorFrame::empty();
                (f.width, f.height) = self.last_size;
                return Ok(f);
            }
        };

        if let Some(msg) = frame.error.take() {
            warn!("detector reported: {msg}");
            frame.hands.clear();
        }
        self.last_size = (frame.width, frame.height);
        Ok(frame)
    }
}

impl Drop for HandDetector {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_frame() {
        let lm: Vec<String> = (0..21)
            .map(|i| format!(r#"{{"x":0.{i:02},"y":0.5,"z":-0.01}}"#))
            .collect();
        let line = format!(
            r#"{{"width":1280,"height":720,"hands":[{{"score":0.93,"handedness":"Right","landmarks":[{}]}}],"error":null}}"#,
            lm.join(",")
        );
        let frame = parse_frame(&line).unwrap();
        assert_eq!(frame.width, 1280.0);
        assert_eq!(frame.height, 720.0);
        assert_eq!(frame.hands.len(), 1);
        assert_eq!(frame.hands[0].landmarks.len(), 21);
        assert!(frame.error.is_none());
    }

    #[test]
    fn parses_a_frame_with_no_hands() {
        let frame = parse_frame(r#"{"width":640,"height":480,"hands":[]}"#).unwrap();
        assert!(frame.hands.is_empty());
    }

    #[test]
    fn parses_a_detector_error_line() {
        let frame =
            parse_frame(r#"{"width":640,"height":480,"hands":[],"error":"camera lost"}"#).unwrap();
        assert_eq!(frame.error.as_deref(), Some("camera lost"));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(parse_frame("not json").is_err());
    }

    #[test]
    fn missing_script_is_fatal() {
        let err = HandDetector::spawn("python3", Path::new("/nonexistent/detect.py"))
            .err()
            .unwrap();
        assert!(matches!(err, DetectorError::ScriptMissing(_)));
    }
}
