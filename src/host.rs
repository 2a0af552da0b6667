//! The host-collaborator seam.
//!
//! The widget renders state it does not own: playback data, authentication,
//! and the user profile all live in an external host process. This module
//! defines the command surface the widget consumes ([`HostClient`]), a
//! JSON-lines child-process implementation ([`ProcessHost`]), and the
//! background worker that services refresh and transport commands so no
//! host call ever runs on the UI thread.

use crate::config::HostConfig;
use crate::playback::{AlbumRef, PlaybackSnapshot, UserProfile};
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader, Write as _};
use std::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to reach host process: {0}")]
    Io(#[from] std::io::Error),
    #[error("host returned a malformed response: {0}")]
    Protocol(#[from] serde_json::Error),
    #[error("host rejected {command}: {message}")]
    Rejected {
        command: &'static str,
        message: String,
    },
    #[error("host process is no longer running")]
    Disconnected,
}

pub type HostResult<T> = Result<T, HostError>;

/// Request-invocation surface of the host process.
///
/// Every call blocks the worker thread it runs on until the host answers;
/// nothing here is called from the UI thread.
pub trait HostClient: Send {
    fn get_currently_playing(&mut self) -> HostResult<Option<PlaybackSnapshot>>;
    fn get_album(&mut self, album_id: &str) -> HostResult<AlbumRef>;
    fn start_playback(&mut self) -> HostResult<()>;
    fn pause_playback(&mut self) -> HostResult<()>;
    fn next_track(&mut self) -> HostResult<()>;
    fn previous_track(&mut self) -> HostResult<()>;
    fn login(&mut self) -> HostResult<()>;
    fn authenticated(&mut self) -> HostResult<bool>;
    fn get_me(&mut self) -> HostResult<Option<UserProfile>>;
}

#[derive(Serialize)]
struct Request<'a> {
    id: u64,
    command: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    args: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct Response {
    id: u64,
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default)]
    error: Option<String>,
}

/// Talks to the host process over its stdio: one JSON request per line in,
/// one JSON response per line out. The child's stderr is drained into the
/// log on a side thread.
pub struct ProcessHost {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    next_id: u64,
}

impl ProcessHost {
    pub fn spawn(config: &HostConfig) -> anyhow::Result<Self> {
        let mut child = Command::new(&config.command)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("Failed to spawn host process: {}", config.command))?;

        let stdin = child
            .stdin
            .take()
            .context("Failed to capture host stdin")?;
        let stdout = child
            .stdout
            .take()
            .context("Failed to capture host stdout")?;
        let stderr = child
            .stderr
            .take()
            .context("Failed to capture host stderr")?;

        thread::spawn(move || Self::drain_stderr(stderr));

        log::info!("Host process spawned with PID {}", child.id());

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            next_id: 1,
        })
    }

    fn drain_stderr(stderr: ChildStderr) {
        let reader = BufReader::new(stderr);
        for line in reader.lines() {
            match line {
                Ok(line) => {
                    if !line.trim().is_empty() {
                        log::info!("[host] {line}");
                    }
                }
                Err(err) => {
                    log::error!("Error reading host stderr: {err}");
                    break;
                }
            }
        }
        log::warn!("Host stderr reader stopped");
    }

    fn invoke<T: DeserializeOwned>(
        &mut self,
        command: &'static str,
        args: Option<serde_json::Value>,
    ) -> HostResult<T> {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);

        let mut line = serde_json::to_string(&Request { id, command, args })?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes())?;
        self.stdin.flush()?;

        loop {
            let mut buf = String::new();
            if self.stdout.read_line(&mut buf)? == 0 {
                return Err(HostError::Disconnected);
            }
            let trimmed = buf.trim();
            if trimmed.is_empty() {
                continue;
            }
            let response: Response = serde_json::from_str(trimmed)?;
            if response.id != id {
                // Answer to a request whose caller already gave up.
                log::debug!("Skipping stale host response for request {}", response.id);
                continue;
            }
            if let Some(message) = response.error {
                return Err(HostError::Rejected { command, message });
            }
            return Ok(serde_json::from_value(response.data)?);
        }
    }

    fn invoke_ack(&mut self, command: &'static str) -> HostResult<()> {
        // Acknowledgement payloads are ignored by design.
        self.invoke::<serde_json::Value>(command, None).map(|_| ())
    }
}

impl HostClient for ProcessHost {
    fn get_currently_playing(&mut self) -> HostResult<Option<PlaybackSnapshot>> {
        self.invoke("get_currently_playing", None)
    }

    fn get_album(&mut self, album_id: &str) -> HostResult<AlbumRef> {
        self.invoke(
            "get_album",
            Some(serde_json::json!({ "album_id": album_id })),
        )
    }

    fn start_playback(&mut self) -> HostResult<()> {
        self.invoke_ack("start_playback")
    }

    fn pause_playback(&mut self) -> HostResult<()> {
        self.invoke_ack("pause_playback")
    }

    fn next_track(&mut self) -> HostResult<()> {
        self.invoke_ack("next_track")
    }

    fn previous_track(&mut self) -> HostResult<()> {
        self.invoke_ack("previous_track")
    }

    fn login(&mut self) -> HostResult<()> {
        self.invoke_ack("login")
    }

    fn authenticated(&mut self) -> HostResult<bool> {
        self.invoke("authenticated", None)
    }

    fn get_me(&mut self) -> HostResult<Option<UserProfile>> {
        self.invoke("get_me", None)
    }
}

impl Drop for ProcessHost {
    fn drop(&mut self) {
        if let Err(err) = self.child.kill() {
            log::debug!("Failed to kill host process: {err}");
        }
        match self.child.wait() {
            Ok(status) => log::info!("Host process exited with status {status}"),
            Err(err) => log::error!("Failed to reap host process: {err}"),
        }
    }
}

pub enum HostCommand {
    /// One scheduler tick: auth check, one-time profile fetch, playback
    /// refresh.
    Poll,
    Play,
    Pause,
    NextTrack,
    PreviousTrack,
    Login,
    Shutdown,
}

pub enum HostEvent {
    Authenticated(bool),
    Profile(Option<UserProfile>),
    Playback(Option<PlaybackSnapshot>),
}

/// Runs a [`HostClient`] on its own thread, accepting commands from the UI
/// and streaming results back. Commands are serviced in arrival order; a
/// failed refresh produces no event at all, so the next tick simply tries
/// again.
pub fn spawn_host_worker(
    mut client: Box<dyn HostClient>,
) -> (mpsc::Sender<HostCommand>, mpsc::Receiver<HostEvent>) {
    let (command_tx, command_rx) = mpsc::channel();
    let (event_tx, event_rx) = mpsc::channel();

    thread::spawn(move || {
        let mut profile_loaded = false;
        while let Ok(command) = command_rx.recv() {
            match command {
                HostCommand::Poll => {
                    if run_poll_tick(client.as_mut(), &event_tx, &mut profile_loaded).is_err() {
                        // UI side is gone.
                        break;
                    }
                }
                HostCommand::Play => fire_and_forget("start_playback", client.start_playback()),
                HostCommand::Pause => fire_and_forget("pause_playback", client.pause_playback()),
                HostCommand::NextTrack => fire_and_forget("next_track", client.next_track()),
                HostCommand::PreviousTrack => {
                    fire_and_forget("previous_track", client.previous_track());
                }
                HostCommand::Login => fire_and_forget("login", client.login()),
                HostCommand::Shutdown => break,
            }
        }
        log::debug!("Host worker stopped");
    });

    (command_tx, event_rx)
}

fn run_poll_tick(
    client: &mut dyn HostClient,
    event_tx: &mpsc::Sender<HostEvent>,
    profile_loaded: &mut bool,
) -> Result<(), mpsc::SendError<HostEvent>> {
    let authenticated = match client.authenticated() {
        Ok(value) => value,
        Err(err) => {
            log::debug!("Authentication check failed: {err}");
            return Ok(());
        }
    };
    event_tx.send(HostEvent::Authenticated(authenticated))?;
    if !authenticated {
        return Ok(());
    }

    if !*profile_loaded {
        match client.get_me() {
            Ok(profile) => {
                *profile_loaded = true;
                event_tx.send(HostEvent::Profile(profile))?;
            }
            Err(err) => log::debug!("Profile fetch failed, retrying next tick: {err}"),
        }
    }

    match client.get_currently_playing() {
        Ok(snapshot) => {
            let snapshot = resolve_album_art(client, snapshot);
            event_tx.send(HostEvent::Playback(snapshot))?;
        }
        Err(err) => log::debug!("Playback refresh failed, retrying next tick: {err}"),
    }

    Ok(())
}

/// Some hosts omit album images from the playback payload. When the album
/// id is known, fill the gap from the album lookup; otherwise the
/// derivation layer falls back to the placeholder artwork.
fn resolve_album_art(
    client: &mut dyn HostClient,
    snapshot: Option<PlaybackSnapshot>,
) -> Option<PlaybackSnapshot> {
    let mut snapshot = snapshot?;
    if snapshot.item.album.images.is_empty() {
        if let Some(id) = snapshot.item.album.id.clone() {
            match client.get_album(&id) {
                Ok(album) => snapshot.item.album = album,
                Err(err) => log::debug!("Album lookup for {id} failed: {err}"),
            }
        }
    }
    Some(snapshot)
}

fn fire_and_forget(command: &str, result: HostResult<()>) {
    // Transport commands are dispatched for their side effect only; the
    // next poll reflects whatever actually happened.
    if let Err(err) = result {
        log::warn!("{command} failed: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_envelope_omits_empty_args() {
        let line = serde_json::to_string(&Request {
            id: 7,
            command: "next_track",
            args: None,
        })
        .unwrap();
        assert_eq!(line, r#"{"id":7,"command":"next_track"}"#);
    }

    #[test]
    fn response_envelope_tolerates_missing_data() {
        let response: Response = serde_json::from_str(r#"{"id":3}"#).unwrap();
        assert_eq!(response.id, 3);
        assert!(response.data.is_null());
        assert!(response.error.is_none());

        // Null data reads back as "nothing playing", not an error.
        let playing: Option<PlaybackSnapshot> = serde_json::from_value(response.data).unwrap();
        assert!(playing.is_none());
    }

    #[test]
    fn rejected_response_carries_the_host_message() {
        let response: Response =
            serde_json::from_str(r#"{"id":4,"error":"no active device"}"#).unwrap();
        assert_eq!(response.error.as_deref(), Some("no active device"));
    }
}
