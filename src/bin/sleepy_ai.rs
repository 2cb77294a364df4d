//! An AI that says hello and then nothing, ever.
//!
//! Exists to exercise the controller's receive deadlines end to end: it
//! passes the wake-up probe and the hello exchange, then sits silent until
//! the controller gives up on it and force-kills the process.

use std::io::Write;
use std::os::unix::net::UnixStream;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::json;

const MAX_MSG_SIZE: usize = 256;

fn main() -> Result<()> {
    let socket_path = std::env::args()
        .nth(1)
        .context("usage: sleepy_ai <socket path>")?;
    let mut stream = UnixStream::connect(&socket_path)
        .with_context(|| format!("cannot connect to {socket_path}"))?;

    let hello = json!({ "mt": 1, "ai": "Sleepy AI", "au": "Battleships Controller" }).to_string();
    let mut frame = [0u8; MAX_MSG_SIZE];
    frame[..hello.len()].copy_from_slice(hello.as_bytes());
    stream.write_all(&frame).context("hello failed")?;

    loop {
        std::thread::sleep(Duration::from_secs(60));
    }
}
