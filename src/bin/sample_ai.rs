//! Reference Battleships AI client.
//!
//! Connects to the controller socket given as the single argument, says
//! hello, places ships first-fit left to right, and shoots row-major. Dumb
//! but rule-abiding: it never overlaps its own ships, never shoots off the
//! board, and never repeats a shot, so it exercises every happy path of the
//! controller. Also the template handed to students writing their own AI.

use std::io::{Read, Write};
use std::os::unix::net::UnixStream;

use anyhow::{bail, Context, Result};
use serde_json::{json, Value};

const MAX_MSG_SIZE: usize = 256;

const WATER: i64 = b'~' as i64;
const SHIP: i64 = b'S' as i64;
const HORIZONTAL: i64 = b'H' as i64;

#[derive(Default)]
struct SampleAi {
    board_size: usize,
    player_num: i64,
    // own ships as this client knows them
    ship_board: Vec<Vec<i64>>,
    // everywhere this client has shot, by returned value
    shot_board: Vec<Vec<i64>>,
}

impl SampleAi {
    fn setup(&mut self, board_size: usize, player_num: i64) {
        self.board_size = board_size;
        self.player_num = player_num;
        self.clear_boards();
    }

    fn clear_boards(&mut self) {
        self.ship_board = vec![vec![WATER; self.board_size]; self.board_size];
        self.shot_board = vec![vec![WATER; self.board_size]; self.board_size];
    }

    /// First horizontal spot where the ship fits without touching another.
    fn choose_ship_place(&mut self, len: usize) -> (usize, usize) {
        for row in 0..self.board_size {
            for col in 0..=self.board_size.saturating_sub(len) {
                if (0..len).all(|l| self.ship_board[row][col + l] == WATER) {
                    for l in 0..len {
                        self.ship_board[row][col + l] = SHIP;
                    }
                    return (row, col);
                }
            }
        }
        (0, 0)
    }

    /// First cell not yet shot, row-major.
    fn choose_shot(&self) -> (usize, usize) {
        for row in 0..self.board_size {
            for col in 0..self.board_size {
                if self.shot_board[row][col] == WATER {
                    return (row, col);
                }
            }
        }
        (0, 0)
    }

    fn handle_shot_return(&mut self, msg: &Value) {
        let mine = if self.player_num == 1 { "p1" } else { "p2" };
        let theirs = if self.player_num == 1 { "p2" } else { "p1" };

        if let Some(shot) = msg.get(mine).and_then(|p| p.get("st")) {
            if let Some((row, col, value)) = shot_fields(shot) {
                self.shot_board[row][col] = value;
            }
        }
        if let Some(shot) = msg.get(theirs).and_then(|p| p.get("st")) {
            if let Some((row, col, value)) = shot_fields(shot) {
                self.ship_board[row][col] = value;
            }
        }
    }
}

fn shot_fields(shot: &Value) -> Option<(usize, usize, i64)> {
    let row = usize::try_from(shot.get("r")?.as_i64()?).ok()?;
    let col = usize::try_from(shot.get("c")?.as_i64()?).ok()?;
    let value = shot.get("v")?.as_i64()?;
    Some((row, col, value))
}

fn send(stream: &mut UnixStream, msg: &Value) -> Result<()> {
    let text = msg.to_string();
    let bytes = text.as_bytes();
    let mut frame = [0u8; MAX_MSG_SIZE];
    let len = bytes.len().min(MAX_MSG_SIZE - 1);
    frame[..len].copy_from_slice(&bytes[..len]);
    stream.write_all(&frame).context("send failed")
}

fn recv(stream: &mut UnixStream) -> Result<Value> {
    let mut frame = [0u8; MAX_MSG_SIZE];
    stream.read_exact(&mut frame).context("recv failed")?;
    let text_end = frame.iter().position(|&b| b == 0).unwrap_or(MAX_MSG_SIZE);
    let text = std::str::from_utf8(&frame[..text_end]).context("non-UTF8 frame")?;
    serde_json::from_str(text).context("non-JSON frame")
}

fn main() -> Result<()> {
    let socket_path = std::env::args()
        .nth(1)
        .context("usage: sample_ai <socket path>")?;
    let mut stream = UnixStream::connect(&socket_path)
        .with_context(|| format!("cannot connect to {socket_path}"))?;

    send(
        &mut stream,
        &json!({ "mt": 1, "ai": "Sample AI", "au": "Battleships Controller" }),
    )?;

    let mut ai = SampleAi::default();
    loop {
        let msg = recv(&mut stream)?;
        match msg.get("mt").and_then(Value::as_i64) {
            // SetupMatch
            Some(2) => {
                let board_size = msg
                    .get("bs")
                    .and_then(Value::as_u64)
                    .context("setup without board size")? as usize;
                let player_num = msg
                    .get("pn")
                    .and_then(Value::as_i64)
                    .context("setup without player number")?;
                ai.setup(board_size, player_num);
            }
            // StartGame
            Some(3) => ai.clear_boards(),
            // PlaceShip
            Some(4) => {
                let len = msg
                    .get("l")
                    .and_then(Value::as_u64)
                    .context("place ship without length")? as usize;
                let (row, col) = ai.choose_ship_place(len);
                send(
                    &mut stream,
                    &json!({ "mt": 5, "r": row, "c": col, "l": len, "d": HORIZONTAL }),
                )?;
            }
            // TakeShot
            Some(6) => {
                let (row, col) = ai.choose_shot();
                send(&mut stream, &json!({ "mt": 7, "r": row, "c": col }))?;
            }
            // ShotReturn; TakeShot arrives only once per game, so ns=true
            // is the cue to fire the next round's shot unprompted
            Some(8) => {
                ai.handle_shot_return(&msg);
                if msg.get("ns").and_then(Value::as_bool) == Some(true) {
                    let (row, col) = ai.choose_shot();
                    send(&mut stream, &json!({ "mt": 7, "r": row, "c": col }))?;
                }
            }
            // GameOver: nothing to do between games
            Some(9) => {}
            // MatchOver
            Some(10) => break,
            other => bail!("unexpected message type {other:?}"),
        }
    }
    Ok(())
}
