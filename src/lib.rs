//! # Battleships controller
//!
//! A controller for head-to-head Battleships AI tournaments. It launches
//! two opaque AI programs as child processes, talks to them over a local
//! Unix-domain socket with a small fixed-frame JSON protocol, enforces the
//! game rules, and records everything into replayable JSON logs.
//!
//! It provides:
//! - A blocking request/response [`transport`] with per-receive deadlines
//!   and leak-free child-process lifecycle
//! - The wire [`protocol`] codec with strict validation of client messages
//! - A [`game`] engine (ship placement rounds, shot rounds, kill detection,
//!   winner calculation) with symmetric fault attribution
//! - A [`match_runner`] that plays a fixed series of games between one pair
//!   and aggregates stats
//! - A [`contest`] engine: wake-up probe, random pairing, a three-life
//!   elimination loop down to a sole survivor
//! - A [`logs`] codec that persists match and contest logs under `./logs/`
//!   and validates them strictly on the way back in
//!
//! # AI contract
//!
//! An AI is any executable under `./ai_files/` (or `./ai_files/protected/`)
//! with the user-execute bit set. It is started with a single positional
//! argument, the socket path, and must:
//!
//! 1. connect to the socket,
//! 2. send `Hello` with its AI and author names,
//! 3. wait for `SetupMatch` before anything else,
//! 4. answer every `PlaceShip` with `ShipPlaced` and every `TakeShot` with
//!    `ShotTaken` within 500 ms,
//! 5. exit cleanly within 500 ms of `MatchOver`.
//!
//! Every frame is exactly 256 bytes: JSON text followed by NUL padding. See
//! `src/bin/sample_ai.rs` for a complete reference client.
//!
//! # Runtime surface
//!
//! The interactive menus and board rendering live in an external display
//! collaborator. Its hand-off is `./options.json` (see [`options`]); the
//! one CLI flag the controller itself takes is `-d`/`--debug`, which
//! disables every deadline so an AI can be stepped through a debugger.

pub mod board;
pub mod contest;
pub mod game;
pub mod logger;
pub mod logs;
pub mod match_runner;
pub mod options;
pub mod protocol;
pub mod rules;
pub mod transport;
pub mod types;

/// Commonly used types and entry points for quick access.
pub mod prelude {
    pub use crate::board::Board;
    pub use crate::contest::run_contest;
    pub use crate::logs::{ContestLog, GameLog, MatchLog};
    pub use crate::match_runner::run_match;
    pub use crate::options::{ContestOptions, Executable, MatchOptions, Options};
    pub use crate::transport::Endpoint;
    pub use crate::types::{
        BoardValue, Direction, ErrorType, FaultStatus, GameResult, PeerFault, PlayerNum, Ship,
        Shot,
    };
}
