//! Wire codec for the controller⇄AI JSON protocol.
//!
//! One JSON object per 256-byte frame. Encoding builds a `serde_json` DOM
//! and dumps it; decoding parses into a DOM and runs an explicit validation
//! pass (presence, JSON type, message type, value ranges) before any field
//! is read, so a malformed client message can never half-populate a struct.
//! Decode failures return the raw received text for the logs.

use serde_json::{json, Value};

use crate::logs::GameStats;
use crate::transport::MAX_NAME_SIZE;
use crate::types::{Direction, PeerFault, PlayerNum, Ship, Shot};

/// Message type codes, numbered in order of first occurrence in a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum MessageType {
    Hello = 1,
    SetupMatch = 2,
    StartGame = 3,
    PlaceShip = 4,
    ShipPlaced = 5,
    TakeShot = 6,
    ShotTaken = 7,
    ShotReturn = 8,
    GameOver = 9,
    MatchOver = 10,
}

/// JSON keys shared between the wire protocol and the log files.
pub mod key {
    pub const MESSAGE_TYPE: &str = "mt";
    pub const PLAYER_NUM: &str = "pn";
    pub const AI_NAME: &str = "ai";
    pub const AUTHOR_NAMES: &str = "au";
    pub const BOARD_SIZE: &str = "bs";
    pub const LEN: &str = "l";
    pub const ROW: &str = "r";
    pub const COL: &str = "c";
    pub const DIR: &str = "d";
    pub const VALUE: &str = "v";
    pub const PLAYER_1: &str = "p1";
    pub const PLAYER_2: &str = "p2";
    pub const SHIP: &str = "sp";
    pub const SHOT: &str = "st";
    pub const NEXT_SHOT: &str = "ns";
    pub const GAME_RESULT: &str = "gr";
    pub const NUM_BOARD_SHOT: &str = "nb";
    pub const NUM_HITS: &str = "nh";
    pub const NUM_MISSES: &str = "nm";
    pub const NUM_DUPLICATES: &str = "nd";
    pub const SHIPS_KILLED: &str = "sk";
}

/* ── create message functions ─────────────────────────────────────────── */

pub fn setup_match_msg(board_size: usize, num: PlayerNum) -> String {
    json!({
        (key::MESSAGE_TYPE): MessageType::SetupMatch as i64,
        (key::BOARD_SIZE): board_size as i64,
        (key::PLAYER_NUM): num as u8 as i64,
    })
    .to_string()
}

pub fn start_game_msg() -> String {
    json!({ (key::MESSAGE_TYPE): MessageType::StartGame as i64 }).to_string()
}

pub fn place_ship_msg(length: i32) -> String {
    json!({
        (key::MESSAGE_TYPE): MessageType::PlaceShip as i64,
        (key::LEN): length,
    })
    .to_string()
}

pub fn take_shot_msg() -> String {
    json!({ (key::MESSAGE_TYPE): MessageType::TakeShot as i64 }).to_string()
}

fn shot_value(shot: &Shot) -> Value {
    json!({
        (key::ROW): shot.row,
        (key::COL): shot.col,
        (key::VALUE): shot.value.code(),
    })
}

fn ship_value(ship: &Ship) -> Value {
    json!({
        (key::ROW): ship.row,
        (key::COL): ship.col,
        (key::LEN): ship.len,
        (key::DIR): ship.dir.code(),
    })
}

/// Both shots of one round, plus any ship each shot sank. A sunk ship is
/// reported under its *owner's* key so each client can mark its own loss.
pub fn shot_return_msg(
    shot1: &Shot,
    shot2: &Shot,
    ships1: &[Ship],
    ships2: &[Ship],
    next_shot: bool,
) -> String {
    let mut p1 = json!({ (key::SHOT): shot_value(shot1) });
    let mut p2 = json!({ (key::SHOT): shot_value(shot2) });

    // player 1 killed a ship of player 2
    if shot1.ship_sunk_idx != -1 {
        p2[key::SHIP] = ship_value(&ships2[shot1.ship_sunk_idx as usize]);
    }
    // player 2 killed a ship of player 1
    if shot2.ship_sunk_idx != -1 {
        p1[key::SHIP] = ship_value(&ships1[shot2.ship_sunk_idx as usize]);
    }

    json!({
        (key::MESSAGE_TYPE): MessageType::ShotReturn as i64,
        (key::PLAYER_1): p1,
        (key::PLAYER_2): p2,
        (key::NEXT_SHOT): next_shot,
    })
    .to_string()
}

pub fn game_over_msg(stats: &GameStats) -> String {
    json!({
        (key::MESSAGE_TYPE): MessageType::GameOver as i64,
        (key::GAME_RESULT): stats.result.code(),
        (key::NUM_BOARD_SHOT): stats.num_board_shot,
        (key::NUM_HITS): stats.hits,
        (key::NUM_MISSES): stats.misses,
        (key::NUM_DUPLICATES): stats.duplicates,
        (key::SHIPS_KILLED): stats.ships_killed,
    })
    .to_string()
}

pub fn match_over_msg() -> String {
    json!({ (key::MESSAGE_TYPE): MessageType::MatchOver as i64 }).to_string()
}

/* ── parse message functions ──────────────────────────────────────────── */

/// Contents of a client `Hello`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hello {
    pub ai_name: String,
    pub author_name: String,
}

fn int_field(obj: &Value, key: &str) -> Option<i64> {
    obj.get(key)?.as_i64()
}

fn str_field<'a>(obj: &'a Value, key: &str) -> Option<&'a str> {
    obj.get(key)?.as_str()
}

fn has_message_type(obj: &Value, expected: MessageType) -> bool {
    int_field(obj, key::MESSAGE_TYPE) == Some(expected as i64)
}

fn truncate_name(name: &str) -> String {
    name.chars().take(MAX_NAME_SIZE).collect()
}

/// Decode and validate a `Hello`. Names longer than [`MAX_NAME_SIZE`]
/// characters are truncated, not rejected.
pub fn parse_hello_msg(text: &str) -> Result<Hello, PeerFault> {
    let fail = || PeerFault::HelloMessage(text.to_string());
    let v: Value = serde_json::from_str(text).map_err(|_| fail())?;

    if !has_message_type(&v, MessageType::Hello) {
        return Err(fail());
    }
    let ai = str_field(&v, key::AI_NAME).ok_or_else(fail)?;
    let authors = str_field(&v, key::AUTHOR_NAMES).ok_or_else(fail)?;

    Ok(Hello {
        ai_name: truncate_name(ai),
        author_name: truncate_name(authors),
    })
}

/// Decode and validate a `ShipPlaced`. Direction must be 'H' or 'V'.
pub fn parse_ship_placed_msg(text: &str) -> Result<Ship, PeerFault> {
    let fail = || PeerFault::ShipPlacedMessage(text.to_string());
    let v: Value = serde_json::from_str(text).map_err(|_| fail())?;

    if !has_message_type(&v, MessageType::ShipPlaced) {
        return Err(fail());
    }
    let row = int_field(&v, key::ROW).ok_or_else(fail)?;
    let col = int_field(&v, key::COL).ok_or_else(fail)?;
    let len = int_field(&v, key::LEN).ok_or_else(fail)?;
    let dir = int_field(&v, key::DIR)
        .and_then(Direction::from_code)
        .ok_or_else(fail)?;

    Ok(Ship {
        row: row as i32,
        col: col as i32,
        len: len as i32,
        dir,
        alive: false,
    })
}

/// Decode and validate a `ShotTaken`.
pub fn parse_shot_taken_msg(text: &str) -> Result<Shot, PeerFault> {
    let fail = || PeerFault::ShotTakenMessage(text.to_string());
    let v: Value = serde_json::from_str(text).map_err(|_| fail())?;

    if !has_message_type(&v, MessageType::ShotTaken) {
        return Err(fail());
    }
    let row = int_field(&v, key::ROW).ok_or_else(fail)?;
    let col = int_field(&v, key::COL).ok_or_else(fail)?;

    Ok(Shot::new(row as i32, col as i32))
}
