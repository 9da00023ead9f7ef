//! Control socket for a running session.
//!
//! One JSON request per connection, one JSON reply, newline-delimited.
//! The listener thread only reads the shared status snapshot and forwards
//! commands over a channel; the session loop applies them between frames.

use anyhow::Result;
use log::{error, info};
use serde::Serialize;
use std::{
    fs,
    io::{BufRead, BufReader, Write},
    os::unix::net::{UnixListener, UnixStream},
    path::PathBuf,
    sync::{Arc, Mutex, mpsc},
    thread,
};

use super::runtime::socket_path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ToggleAi,
    Stop,
}

/// Snapshot the session loop refreshes once per iteration.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionStatus {
    pub ai_enabled: bool,
    pub ai_thinking: bool,
    pub white_to_move: bool,
    pub in_check: bool,
    pub checkmate: bool,
    pub stalemate: bool,
    pub iterations: u64,
}

pub struct CommandListener {
    sock: PathBuf,
}

impl CommandListener {
    /// Bind the control socket and start the accept loop on its own thread.
    /// Commands arrive on the returned receiver.
    pub fn spawn(status: Arc<Mutex<SessionStatus>>) -> Result<(Self, mpsc::Receiver<Command>)> {
        let sock = socket_path();
        if sock.exists() {
            let _ = fs::remove_file(&sock);
        }
        let listener = UnixListener::bind(&sock)?;
        info!("control socket at {}", sock.display());

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for stream in listener.incoming() {
                match stream {
                    Ok(stream) => {
                        if let Err(e) = handle_client(stream, &status, &tx) {
                            error!("ipc client error: {e}");
                        }
                    }
                    Err(e) => {
                        error!("ipc accept error: {e}");
                        break;
                    }
                }
            }
        });

        Ok((Self { sock }, rx))
    }
}

impl Drop for CommandListener {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.sock);
    }
}

fn handle_client(
    mut stream: UnixStream,
    status: &Arc<Mutex<SessionStatus>>,
    tx: &mpsc::Sender<Command>,
) -> Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut line = String::new();
    reader.read_line(&mut line)?;
    if line.trim().is_empty() {
        return Ok(());
    }
    let req: serde_json::Value = serde_json::from_str(&line)?;
    let op = req.get("op").and_then(|v| v.as_str()).unwrap_or("");

    let resp = match op {
        "status" => {
            let snap = status.lock().unwrap().clone();
            serde_json::json!({"ok": true, "data": snap})
        }
        "toggle-ai" => {
            let _ = tx.send(Command::ToggleAi);
            serde_json::json!({"ok": true, "data": "toggling opponent"})
        }
        "stop" => {
            let _ = tx.send(Command::Stop);
            serde_json::json!({"ok": true, "data": "stopping session"})
        }
        _ => serde_json::json!({"ok": false, "error": format!("unknown op: {op}")}),
    };

    write!(stream, "{}\n", resp)?;
    Ok(())
}

// client helper
pub fn client_request(req: serde_json::Value) -> Result<serde_json::Value> {
    let sock = socket_path();
    if !sock.exists() {
        return Err(anyhow::anyhow!(
            "no pinchess session is running (socket missing at {})",
            sock.display()
        ));
    }
    let mut stream = UnixStream::connect(sock)?;
    let line = serde_json::to_string(&req)? + "\n";
    stream.write_all(line.as_bytes())?;
    let mut reader = BufReader::new(stream);
    let mut resp = String::new();
    reader.read_line(&mut resp)?;
    let v: serde_json::Value = serde_json::from_str(&resp)?;
    Ok(v)
}
