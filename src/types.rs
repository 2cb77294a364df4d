//! Shared value types for the Battleships controller.
//!
//! Every enum that crosses the wire or lands in a log file carries a stable
//! integer code (`as i64` / `from_code`). The codes are the ASCII characters
//! the protocol has always used, so logs written by older controllers stay
//! readable.

use std::fmt;

/// Orientation of a placed ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Direction {
    Horizontal = b'H',
    Vertical = b'V',
}

impl Direction {
    /// Decode a wire/log integer code ('H' = 72, 'V' = 86).
    pub fn from_code(code: i64) -> Option<Direction> {
        match code {
            c if c == b'H' as i64 => Some(Direction::Horizontal),
            c if c == b'V' as i64 => Some(Direction::Vertical),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        self as u8 as i64
    }
}

/// State of a single board cell, and the value returned for a shot at it.
///
/// The duplicate values are distinct codes so a client can tell a wasted
/// shot from a fresh one without tracking its own history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BoardValue {
    Water = b'~',
    Ship = b'S',
    Hit = b'X',
    Miss = b'*',
    Kill = b'K',
    DuplicateHit = 34,
    DuplicateMiss = 35,
    DuplicateKill = 36,
}

impl BoardValue {
    pub fn from_code(code: i64) -> Option<BoardValue> {
        match code {
            c if c == b'~' as i64 => Some(BoardValue::Water),
            c if c == b'S' as i64 => Some(BoardValue::Ship),
            c if c == b'X' as i64 => Some(BoardValue::Hit),
            c if c == b'*' as i64 => Some(BoardValue::Miss),
            c if c == b'K' as i64 => Some(BoardValue::Kill),
            34 => Some(BoardValue::DuplicateHit),
            35 => Some(BoardValue::DuplicateMiss),
            36 => Some(BoardValue::DuplicateKill),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        self as u8 as i64
    }
}

/// Result of one game (or of one match, at the contest level).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GameResult {
    Win = b'W',
    Loss = b'L',
    Tie = b'T',
}

impl GameResult {
    pub fn from_code(code: i64) -> Option<GameResult> {
        match code {
            c if c == b'W' as i64 => Some(GameResult::Win),
            c if c == b'L' as i64 => Some(GameResult::Loss),
            c if c == b'T' as i64 => Some(GameResult::Tie),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        self as u8 as i64
    }
}

/// Which seat a peer occupies. Sent in `SetupMatch` so a client can tell its
/// own shots from its opponent's in `ShotReturn`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PlayerNum {
    One = 1,
    Two = 2,
}

impl PlayerNum {
    pub fn opponent(self) -> PlayerNum {
        match self {
            PlayerNum::One => PlayerNum::Two,
            PlayerNum::Two => PlayerNum::One,
        }
    }
}

/// A placed ship. Coordinates are signed so an off-board placement coming in
/// from a client is representable until validation rejects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ship {
    pub row: i32,
    pub col: i32,
    pub len: i32,
    pub dir: Direction,
    pub alive: bool,
}

impl Ship {
    /// Cells occupied by the ship, front to back.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        let (rm, cm) = match self.dir {
            Direction::Horizontal => (0, 1),
            Direction::Vertical => (1, 0),
        };
        (0..self.len).map(move |l| (self.row + l * rm, self.col + l * cm))
    }
}

/// A shot taken by a player, with the derived board value and the index of
/// the opponent ship it sank (-1 when nothing sank).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shot {
    pub row: i32,
    pub col: i32,
    pub value: BoardValue,
    pub ship_sunk_idx: i32,
}

impl Shot {
    pub fn new(row: i32, col: i32) -> Shot {
        Shot {
            row,
            col,
            value: BoardValue::Water,
            ship_sunk_idx: -1,
        }
    }
}

/// Stable error codes stored in log files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum ErrorType {
    Ok = 0,
    // transport
    ErrFork = 1,
    ErrConnect = 2,
    ErrSend = 3,
    ErrReceive = 4,
    // message decoding
    ErrHelloMessage = 5,
    ErrShipPlacedMessage = 6,
    ErrShotTakenMessage = 7,
    // rule checks
    ErrShipLength = 8,
    ErrShipOffBoard = 9,
    ErrShipIntersect = 10,
    ErrShotOffBoard = 11,
}

impl ErrorType {
    pub fn from_code(code: i64) -> Option<ErrorType> {
        Some(match code {
            0 => ErrorType::Ok,
            1 => ErrorType::ErrFork,
            2 => ErrorType::ErrConnect,
            3 => ErrorType::ErrSend,
            4 => ErrorType::ErrReceive,
            5 => ErrorType::ErrHelloMessage,
            6 => ErrorType::ErrShipPlacedMessage,
            7 => ErrorType::ErrShotTakenMessage,
            8 => ErrorType::ErrShipLength,
            9 => ErrorType::ErrShipOffBoard,
            10 => ErrorType::ErrShipIntersect,
            11 => ErrorType::ErrShotOffBoard,
            _ => return None,
        })
    }

    pub fn code(self) -> i64 {
        self as i64
    }
}

/// A fault attributed to one peer at one protocol step.
///
/// Message faults carry the raw received text for later display; rule faults
/// carry the offending ship or shot. `Option<PeerFault>` stands in for the
/// old OK/error pair: `None` means the step went through.
#[derive(Debug, Clone, PartialEq)]
pub enum PeerFault {
    Fork,
    Connect,
    Send,
    Receive,
    HelloMessage(String),
    ShipPlacedMessage(String),
    ShotTakenMessage(String),
    ShipLength(Ship),
    ShipOffBoard(Ship),
    ShipIntersect(Ship),
    ShotOffBoard(Shot),
}

impl PeerFault {
    pub fn error_type(&self) -> ErrorType {
        match self {
            PeerFault::Fork => ErrorType::ErrFork,
            PeerFault::Connect => ErrorType::ErrConnect,
            PeerFault::Send => ErrorType::ErrSend,
            PeerFault::Receive => ErrorType::ErrReceive,
            PeerFault::HelloMessage(_) => ErrorType::ErrHelloMessage,
            PeerFault::ShipPlacedMessage(_) => ErrorType::ErrShipPlacedMessage,
            PeerFault::ShotTakenMessage(_) => ErrorType::ErrShotTakenMessage,
            PeerFault::ShipLength(_) => ErrorType::ErrShipLength,
            PeerFault::ShipOffBoard(_) => ErrorType::ErrShipOffBoard,
            PeerFault::ShipIntersect(_) => ErrorType::ErrShipIntersect,
            PeerFault::ShotOffBoard(_) => ErrorType::ErrShotOffBoard,
        }
    }
}

impl fmt::Display for PeerFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerFault::Fork => write!(f, "player process creation failed"),
            PeerFault::Connect => write!(f, "connection to player failed"),
            PeerFault::Send => write!(f, "failed to send to player"),
            PeerFault::Receive => write!(f, "failed to receive from player"),
            PeerFault::HelloMessage(m) => write!(f, "invalid hello msg from player: <{m}>"),
            PeerFault::ShipPlacedMessage(m) => write!(f, "invalid ship msg from player: <{m}>"),
            PeerFault::ShotTakenMessage(m) => write!(f, "invalid shot msg from player: <{m}>"),
            PeerFault::ShipLength(s) => write!(f, "ship with invalid length: {s:?}"),
            PeerFault::ShipOffBoard(s) => write!(f, "ship doesn't fit onto the board: {s:?}"),
            PeerFault::ShipIntersect(s) => {
                write!(f, "ship intersects a ship already on the board: {s:?}")
            }
            PeerFault::ShotOffBoard(s) => write!(f, "shot doesn't fit onto the board: {s:?}"),
        }
    }
}

/// Which side(s) faulted during one lockstep protocol exchange.
///
/// The controller always performs the step for both peers before looking at
/// the outcome, so fault attribution is symmetric and deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultStatus {
    Clear,
    PlayerOne,
    PlayerTwo,
    Both,
}

impl FaultStatus {
    pub fn of(p1: &Option<PeerFault>, p2: &Option<PeerFault>) -> FaultStatus {
        match (p1.is_some(), p2.is_some()) {
            (false, false) => FaultStatus::Clear,
            (true, false) => FaultStatus::PlayerOne,
            (false, true) => FaultStatus::PlayerTwo,
            (true, true) => FaultStatus::Both,
        }
    }

    pub fn is_clear(self) -> bool {
        self == FaultStatus::Clear
    }
}
