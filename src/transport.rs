//! Local stream-socket endpoint and AI peer processes.
//!
//! The controller owns a Unix-domain listener plus one [`Peer`] per AI: the
//! child process and its connected stream. All I/O is blocking and strictly
//! sequential; the only timers are the per-receive deadline and the
//! graceful-exit wait, both [`RESPONSE_TIMEOUT`]. In debug mode every
//! deadline is disabled so an AI can sit under a debugger.
//!
//! A spawned process is never leaked: a failed accept kills it immediately
//! and dropping a [`Peer`] kills and reaps whatever is still running.

use std::io::{self, ErrorKind, Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::os::unix::process::CommandExt;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use tracing::{instrument, trace, warn};

use crate::types::PeerFault;

/// Exact size of every frame on the wire. The JSON text is a prefix of the
/// frame, padded with NUL bytes.
pub const MAX_MSG_SIZE: usize = 256;

/// AI and author names longer than this are truncated.
pub const MAX_NAME_SIZE: usize = 64;

/// Per-receive deadline, accept deadline, and graceful-exit wait.
pub const RESPONSE_TIMEOUT: Duration = Duration::from_millis(500);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// The controller's listening socket.
pub struct Endpoint {
    listener: UnixListener,
    path: PathBuf,
    debug: bool,
}

impl Endpoint {
    /// Bind the listener at `path`, replacing any stale socket file.
    ///
    /// Failures here (path too long, socket creation, bind) are fatal to the
    /// controller, not attributable to a peer.
    pub fn create(path: &Path, debug: bool) -> anyhow::Result<Endpoint> {
        if let Err(err) = std::fs::remove_file(path) {
            if err.kind() != ErrorKind::NotFound {
                return Err(err).with_context(|| format!("cannot unlink stale socket {path:?}"));
            }
        }
        let listener =
            UnixListener::bind(path).with_context(|| format!("cannot bind socket {path:?}"))?;
        listener
            .set_nonblocking(true)
            .context("cannot make listener non-blocking")?;
        Ok(Endpoint {
            listener,
            path: path.to_path_buf(),
            debug,
        })
    }

    pub fn socket_path(&self) -> &Path {
        &self.path
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Launch `exec` with the socket path as its single argument and wait
    /// for it to connect.
    ///
    /// A spawn failure is `ErrFork`. A missing connection within the
    /// deadline is `ErrConnect`, and the child is killed before returning.
    #[instrument(skip(self), fields(exec = %exec.display()))]
    pub fn spawn_and_accept(&self, exec: &Path) -> Result<Peer, PeerFault> {
        let mut command = Command::new(exec);
        command.arg(&self.path);
        // The controller ignores SIGINT while a match runs; the child must
        // not inherit that, or Ctrl-C could never stop a stuck AI.
        unsafe {
            command.pre_exec(|| {
                libc::signal(libc::SIGINT, libc::SIG_DFL);
                Ok(())
            });
        }

        let child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                warn!("failed to start player process: {err}");
                return Err(PeerFault::Fork);
            }
        };
        trace!(pid = child.id(), "player process started");

        match self.accept() {
            Ok(stream) => Ok(Peer {
                child,
                stream,
                reaped: false,
            }),
            Err(err) => {
                warn!("player never connected: {err}");
                let mut child = child;
                let _ = child.kill();
                let _ = child.wait();
                Err(PeerFault::Connect)
            }
        }
    }

    fn accept(&self) -> io::Result<UnixStream> {
        let stream = if self.debug {
            self.listener.set_nonblocking(false)?;
            let result = self.listener.accept();
            self.listener.set_nonblocking(true)?;
            result?.0
        } else {
            let deadline = Instant::now() + RESPONSE_TIMEOUT;
            loop {
                match self.listener.accept() {
                    Ok((stream, _addr)) => break stream,
                    Err(err) if err.kind() == ErrorKind::WouldBlock => {
                        if Instant::now() >= deadline {
                            return Err(io::Error::new(
                                ErrorKind::TimedOut,
                                "no connection made to the controller",
                            ));
                        }
                        thread::sleep(POLL_INTERVAL);
                    }
                    Err(err) => return Err(err),
                }
            }
        };

        if !self.debug {
            stream.set_read_timeout(Some(RESPONSE_TIMEOUT))?;
        }
        Ok(stream)
    }

    /// Drop the listener and unlink the socket path.
    pub fn close(self) {}
}

impl Drop for Endpoint {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// One AI: its process and its connected stream.
///
/// Dropping a peer force-kills and reaps the process if it is still around.
#[derive(Debug)]
pub struct Peer {
    child: Child,
    stream: UnixStream,
    reaped: bool,
}

impl Peer {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Send one frame: the text truncated to [`MAX_MSG_SIZE`]` - 1` bytes,
    /// NUL-padded to exactly [`MAX_MSG_SIZE`].
    pub fn send(&mut self, text: &str) -> Result<(), PeerFault> {
        let mut frame = [0u8; MAX_MSG_SIZE];
        let bytes = text.as_bytes();
        let len = bytes.len().min(MAX_MSG_SIZE - 1);
        frame[..len].copy_from_slice(&bytes[..len]);

        self.stream.write_all(&frame).map_err(|err| {
            warn!(pid = self.pid(), "failed to send to player: {err}");
            PeerFault::Send
        })
    }

    /// Receive one frame and return its text (the prefix before the first
    /// NUL). A timeout, a closed stream, and an empty frame all collapse to
    /// `ErrReceive`: from the controller's side they are the same event, a
    /// peer that stopped answering.
    pub fn recv(&mut self) -> Result<String, PeerFault> {
        let mut frame = [0u8; MAX_MSG_SIZE];
        let count = self.stream.read(&mut frame).map_err(|err| {
            warn!(pid = self.pid(), "failed to receive from player: {err}");
            PeerFault::Receive
        })?;
        if count == 0 {
            // usually an AI that exited early
            warn!(pid = self.pid(), "empty read from player");
            return Err(PeerFault::Receive);
        }

        let text_end = frame.iter().position(|&b| b == 0).unwrap_or(MAX_MSG_SIZE);
        if text_end == 0 {
            warn!(pid = self.pid(), "blank frame from player");
            return Err(PeerFault::Receive);
        }
        Ok(String::from_utf8_lossy(&frame[..text_end]).into_owned())
    }

    /// Give the peer [`RESPONSE_TIMEOUT`] to exit on its own after a
    /// `MatchOver`, then force-kill whatever is left.
    pub fn wait_for_exit(&mut self) {
        let deadline = Instant::now() + RESPONSE_TIMEOUT;
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    if !status.success() {
                        warn!(pid = self.child.id(), ?status, "player exit status");
                    }
                    self.reaped = true;
                    return;
                }
                Ok(None) => {
                    if Instant::now() >= deadline {
                        break;
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(_) => break,
            }
        }
        self.force_kill();
    }

    /// Kill and reap the peer process unconditionally.
    pub fn force_kill(&mut self) {
        if self.reaped {
            return;
        }
        let _ = self.child.kill();
        let _ = self.child.wait();
        self.reaped = true;
    }
}

impl Drop for Peer {
    fn drop(&mut self) {
        self.force_kill();
    }
}

/// Ignore or restore SIGINT for the controller process. Matches and
/// contests run with SIGINT ignored so a Ctrl-C lands on the AI children
/// (which always restore default handling) instead of tearing the
/// controller away from its logs mid-write.
pub fn set_sigint_ignored(ignored: bool) {
    let handler = if ignored { libc::SIG_IGN } else { libc::SIG_DFL };
    unsafe {
        libc::signal(libc::SIGINT, handler);
    }
}

/// Ignore SIGTSTP (Ctrl-Z) for the life of the process.
pub fn ignore_sigtstp() {
    unsafe {
        libc::signal(libc::SIGTSTP, libc::SIG_IGN);
    }
}
