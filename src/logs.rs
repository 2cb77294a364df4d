//! Log structures and the on-disk JSON log codec.
//!
//! Every engine writes into these structures as it runs; the codec persists
//! them once at match/contest end under `./logs/`. Reading is strict: every
//! required key is checked for presence and JSON type before any field is
//! taken, and the whole file is rejected on the first mismatch. The schema
//! uses the same short keys as the wire protocol so a log line can be read
//! next to a captured frame.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::{json, Map, Value};

use crate::options::Executable;
use crate::protocol::key;
use crate::types::{
    BoardValue, Direction, ErrorType, GameResult, PeerFault, Ship, Shot,
};

/// Log-only JSON keys (the wire keys live in [`crate::protocol::key`]).
mod log_key {
    pub const ELAPSED_TIME: &str = "et";
    pub const WINS: &str = "W";
    pub const LOSSES: &str = "L";
    pub const TIES: &str = "T";
    pub const TOTAL_WINS: &str = "TW";
    pub const TOTAL_LOSSES: &str = "TL";
    pub const TOTAL_TIES: &str = "TT";
    pub const ERROR: &str = "err";
    pub const ERROR_TYPE: &str = "ert";
    pub const MESSAGE: &str = "msg";
    pub const PLAYERS: &str = "pls";
    pub const PLAYER_IDX: &str = "pid";
    pub const ROUNDS: &str = "rds";
    pub const MATCHES: &str = "mts";
    pub const LIVES: &str = "liv";
    pub const LAST_GAME: &str = "lg";
    pub const GAMES: &str = "gms";
    pub const SHIPS: &str = "sps";
    pub const SHOTS: &str = "sts";
    pub const STATS: &str = "sta";
    pub const INDEX_SHIP: &str = "sid";
    pub const PLAYED: &str = "pd";
}

pub const LOGS_DIR: &str = "logs";
pub const MATCH_LOG: &str = "match_log.json";
pub const CONTEST_LOG: &str = "contest_log.json";

/* ── structures ───────────────────────────────────────────────────────── */

/// Per-player counters for one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameStats {
    pub num_board_shot: i32,
    pub hits: i32,
    pub misses: i32,
    pub duplicates: i32,
    pub ships_killed: i32,
    pub result: GameResult,
}

impl Default for GameStats {
    fn default() -> Self {
        GameStats {
            num_board_shot: 0,
            hits: 0,
            misses: 0,
            duplicates: 0,
            ships_killed: 0,
            result: GameResult::Tie,
        }
    }
}

/// Everything recorded about one player in one game.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GamePlayer {
    pub ships: Vec<Ship>,
    pub shots: Vec<Shot>,
    pub stats: GameStats,
    pub error: Option<PeerFault>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameLog {
    pub player1: GamePlayer,
    pub player2: GamePlayer,
}

/// Per-player totals across one match. `wins`/`losses`/`ties` count games.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStats {
    pub wins: i32,
    pub losses: i32,
    pub ties: i32,
    pub total_num_board_shot: i32,
    pub total_hits: i32,
    pub total_misses: i32,
    pub total_duplicates: i32,
    pub total_ships_killed: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchPlayer {
    pub ai_name: String,
    pub author_name: String,
    pub stats: MatchStats,
    pub error: Option<PeerFault>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchLog {
    pub board_size: usize,
    pub elapsed_time: f64,
    pub player1: MatchPlayer,
    pub player2: MatchPlayer,
    pub games: Vec<GameLog>,
}

/// Per-player totals across a contest. `wins`/`losses`/`ties` count matches;
/// the `total_*` fields sum the game counts of every match played.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContestStats {
    pub wins: i32,
    pub losses: i32,
    pub ties: i32,
    pub total_wins: i32,
    pub total_losses: i32,
    pub total_ties: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContestPlayer {
    pub ai_name: String,
    pub author_name: String,
    pub lives: i32,
    pub played: bool,
    pub stats: ContestStats,
    pub executable: Executable,
    pub error: Option<PeerFault>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContestMatchPlayer {
    pub player_idx: usize,
    pub executable: Executable,
    pub stats: MatchStats,
    pub match_result: GameResult,
    pub error: Option<PeerFault>,
}

impl Default for ContestMatchPlayer {
    fn default() -> Self {
        ContestMatchPlayer {
            player_idx: 0,
            executable: Executable::default(),
            stats: MatchStats::default(),
            match_result: GameResult::Tie,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContestMatch {
    pub elapsed_time: f64,
    pub player1: ContestMatchPlayer,
    pub player2: ContestMatchPlayer,
    pub last_game: GameLog,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContestRound {
    pub matches: Vec<ContestMatch>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContestLog {
    pub board_size: usize,
    pub players: Vec<ContestPlayer>,
    pub rounds: Vec<ContestRound>,
}

/* ── strict DOM accessors ─────────────────────────────────────────────── */

fn req_i64(log: &Value, key: &str) -> Result<i64> {
    log.get(key)
        .and_then(Value::as_i64)
        .with_context(|| format!("missing or non-integer key '{key}'"))
}

fn req_f64(log: &Value, key: &str) -> Result<f64> {
    // an integer where a float belongs is a schema violation
    match log.get(key) {
        Some(v) if v.is_f64() => Ok(v.as_f64().unwrap_or_default()),
        _ => bail!("missing or non-float key '{key}'"),
    }
}

fn req_str<'a>(log: &'a Value, key: &str) -> Result<&'a str> {
    log.get(key)
        .and_then(Value::as_str)
        .with_context(|| format!("missing or non-string key '{key}'"))
}

fn req_bool(log: &Value, key: &str) -> Result<bool> {
    log.get(key)
        .and_then(Value::as_bool)
        .with_context(|| format!("missing or non-boolean key '{key}'"))
}

fn req_obj<'a>(log: &'a Value, key: &str) -> Result<&'a Value> {
    match log.get(key) {
        Some(v) if v.is_object() => Ok(v),
        _ => bail!("missing or non-object key '{key}'"),
    }
}

fn req_arr<'a>(log: &'a Value, key: &str) -> Result<&'a Vec<Value>> {
    log.get(key)
        .and_then(Value::as_array)
        .with_context(|| format!("missing or non-array key '{key}'"))
}

fn req_usize(log: &Value, key: &str) -> Result<usize> {
    usize::try_from(req_i64(log, key)?).with_context(|| format!("negative value for key '{key}'"))
}

fn req_i32(log: &Value, key: &str) -> Result<i32> {
    i32::try_from(req_i64(log, key)?).with_context(|| format!("out-of-range value for key '{key}'"))
}

/* ── ship / shot / error ──────────────────────────────────────────────── */

fn ship_to_value(ship: &Ship) -> Value {
    json!({
        (key::ROW): ship.row,
        (key::COL): ship.col,
        (key::LEN): ship.len,
        (key::DIR): ship.dir.code(),
    })
}

fn ship_from_value(log: &Value) -> Result<Ship> {
    let dir = Direction::from_code(req_i64(log, key::DIR)?).context("invalid ship direction")?;
    Ok(Ship {
        row: req_i32(log, key::ROW)?,
        col: req_i32(log, key::COL)?,
        len: req_i32(log, key::LEN)?,
        dir,
        alive: false,
    })
}

fn shot_to_value(shot: &Shot) -> Value {
    let mut obj = Map::new();
    obj.insert(key::ROW.into(), json!(shot.row));
    obj.insert(key::COL.into(), json!(shot.col));
    obj.insert(key::VALUE.into(), json!(shot.value.code()));
    if shot.ship_sunk_idx != -1 {
        obj.insert(log_key::INDEX_SHIP.into(), json!(shot.ship_sunk_idx));
    }
    Value::Object(obj)
}

fn shot_from_value(log: &Value) -> Result<Shot> {
    let value = BoardValue::from_code(req_i64(log, key::VALUE)?).context("invalid shot value")?;
    // sid is optional; absent means nothing sank
    let ship_sunk_idx = match log.get(log_key::INDEX_SHIP) {
        Some(_) => req_i32(log, log_key::INDEX_SHIP)?,
        None => -1,
    };
    Ok(Shot {
        row: req_i32(log, key::ROW)?,
        col: req_i32(log, key::COL)?,
        value,
        ship_sunk_idx,
    })
}

fn fault_to_value(fault: &Option<PeerFault>) -> Value {
    let error_type = fault
        .as_ref()
        .map(PeerFault::error_type)
        .unwrap_or(ErrorType::Ok);
    let mut obj = Map::new();
    obj.insert(log_key::ERROR_TYPE.into(), json!(error_type.code()));
    match fault {
        Some(
            PeerFault::HelloMessage(text)
            | PeerFault::ShipPlacedMessage(text)
            | PeerFault::ShotTakenMessage(text),
        ) => {
            obj.insert(log_key::MESSAGE.into(), json!(text));
        }
        Some(
            PeerFault::ShipLength(ship)
            | PeerFault::ShipOffBoard(ship)
            | PeerFault::ShipIntersect(ship),
        ) => {
            obj.insert(key::SHIP.into(), ship_to_value(ship));
        }
        Some(PeerFault::ShotOffBoard(shot)) => {
            obj.insert(key::SHOT.into(), shot_to_value(shot));
        }
        _ => {}
    }
    Value::Object(obj)
}

fn fault_from_value(log: &Value) -> Result<Option<PeerFault>> {
    let error_type =
        ErrorType::from_code(req_i64(log, log_key::ERROR_TYPE)?).context("unknown error type")?;
    let fault = match error_type {
        ErrorType::Ok => return Ok(None),
        ErrorType::ErrFork => PeerFault::Fork,
        ErrorType::ErrConnect => PeerFault::Connect,
        ErrorType::ErrSend => PeerFault::Send,
        ErrorType::ErrReceive => PeerFault::Receive,
        ErrorType::ErrHelloMessage => {
            PeerFault::HelloMessage(req_str(log, log_key::MESSAGE)?.to_string())
        }
        ErrorType::ErrShipPlacedMessage => {
            PeerFault::ShipPlacedMessage(req_str(log, log_key::MESSAGE)?.to_string())
        }
        ErrorType::ErrShotTakenMessage => {
            PeerFault::ShotTakenMessage(req_str(log, log_key::MESSAGE)?.to_string())
        }
        ErrorType::ErrShipLength => PeerFault::ShipLength(ship_from_value(req_obj(log, key::SHIP)?)?),
        ErrorType::ErrShipOffBoard => {
            PeerFault::ShipOffBoard(ship_from_value(req_obj(log, key::SHIP)?)?)
        }
        ErrorType::ErrShipIntersect => {
            PeerFault::ShipIntersect(ship_from_value(req_obj(log, key::SHIP)?)?)
        }
        ErrorType::ErrShotOffBoard => {
            PeerFault::ShotOffBoard(shot_from_value(req_obj(log, key::SHOT)?)?)
        }
    };
    Ok(Some(fault))
}

/// Game-level entries persist only the error code; the payload lives in the
/// match- or contest-level entry for the same player.
fn fault_from_error_code(code: i64) -> Result<Option<PeerFault>> {
    let error_type = ErrorType::from_code(code).context("unknown error type")?;
    Ok(match error_type {
        ErrorType::Ok => None,
        ErrorType::ErrFork => Some(PeerFault::Fork),
        ErrorType::ErrConnect => Some(PeerFault::Connect),
        ErrorType::ErrSend => Some(PeerFault::Send),
        ErrorType::ErrReceive => Some(PeerFault::Receive),
        ErrorType::ErrHelloMessage => Some(PeerFault::HelloMessage(String::new())),
        ErrorType::ErrShipPlacedMessage => Some(PeerFault::ShipPlacedMessage(String::new())),
        ErrorType::ErrShotTakenMessage => Some(PeerFault::ShotTakenMessage(String::new())),
        ErrorType::ErrShipLength => Some(PeerFault::ShipLength(placeholder_ship())),
        ErrorType::ErrShipOffBoard => Some(PeerFault::ShipOffBoard(placeholder_ship())),
        ErrorType::ErrShipIntersect => Some(PeerFault::ShipIntersect(placeholder_ship())),
        ErrorType::ErrShotOffBoard => Some(PeerFault::ShotOffBoard(Shot::new(0, 0))),
    })
}

fn placeholder_ship() -> Ship {
    Ship {
        row: 0,
        col: 0,
        len: 0,
        dir: Direction::Horizontal,
        alive: false,
    }
}

/* ── game log ─────────────────────────────────────────────────────────── */

fn game_stats_to_value(stats: &GameStats) -> Value {
    json!({
        (key::GAME_RESULT): stats.result.code(),
        (key::NUM_BOARD_SHOT): stats.num_board_shot,
        (key::NUM_HITS): stats.hits,
        (key::NUM_MISSES): stats.misses,
        (key::NUM_DUPLICATES): stats.duplicates,
        (key::SHIPS_KILLED): stats.ships_killed,
    })
}

fn game_stats_from_value(log: &Value) -> Result<GameStats> {
    let result =
        GameResult::from_code(req_i64(log, key::GAME_RESULT)?).context("invalid game result")?;
    Ok(GameStats {
        num_board_shot: req_i32(log, key::NUM_BOARD_SHOT)?,
        hits: req_i32(log, key::NUM_HITS)?,
        misses: req_i32(log, key::NUM_MISSES)?,
        duplicates: req_i32(log, key::NUM_DUPLICATES)?,
        ships_killed: req_i32(log, key::SHIPS_KILLED)?,
        result,
    })
}

fn game_player_to_value(player: &GamePlayer) -> Value {
    let error_type = player
        .error
        .as_ref()
        .map(PeerFault::error_type)
        .unwrap_or(ErrorType::Ok);
    json!({
        (log_key::SHIPS): player.ships.iter().map(ship_to_value).collect::<Vec<_>>(),
        (log_key::SHOTS): player.shots.iter().map(shot_to_value).collect::<Vec<_>>(),
        (log_key::STATS): game_stats_to_value(&player.stats),
        (log_key::ERROR_TYPE): error_type.code(),
    })
}

fn game_player_from_value(log: &Value) -> Result<GamePlayer> {
    let ships = req_arr(log, log_key::SHIPS)?
        .iter()
        .map(ship_from_value)
        .collect::<Result<Vec<_>>>()?;
    let shots = req_arr(log, log_key::SHOTS)?
        .iter()
        .map(shot_from_value)
        .collect::<Result<Vec<_>>>()?;
    Ok(GamePlayer {
        ships,
        shots,
        stats: game_stats_from_value(req_obj(log, log_key::STATS)?)?,
        error: fault_from_error_code(req_i64(log, log_key::ERROR_TYPE)?)?,
    })
}

impl GameLog {
    pub fn to_value(&self) -> Value {
        json!({
            (key::PLAYER_1): game_player_to_value(&self.player1),
            (key::PLAYER_2): game_player_to_value(&self.player2),
        })
    }

    pub fn from_value(log: &Value) -> Result<GameLog> {
        Ok(GameLog {
            player1: game_player_from_value(req_obj(log, key::PLAYER_1)?)?,
            player2: game_player_from_value(req_obj(log, key::PLAYER_2)?)?,
        })
    }
}

/* ── match log ────────────────────────────────────────────────────────── */

fn match_stats_to_value(stats: &MatchStats) -> Value {
    json!({
        (log_key::WINS): stats.wins,
        (log_key::LOSSES): stats.losses,
        (log_key::TIES): stats.ties,
        (key::NUM_BOARD_SHOT): stats.total_num_board_shot,
        (key::NUM_HITS): stats.total_hits,
        (key::NUM_MISSES): stats.total_misses,
        (key::NUM_DUPLICATES): stats.total_duplicates,
        (key::SHIPS_KILLED): stats.total_ships_killed,
    })
}

fn match_stats_from_value(log: &Value) -> Result<MatchStats> {
    Ok(MatchStats {
        wins: req_i32(log, log_key::WINS)?,
        losses: req_i32(log, log_key::LOSSES)?,
        ties: req_i32(log, log_key::TIES)?,
        total_num_board_shot: req_i32(log, key::NUM_BOARD_SHOT)?,
        total_hits: req_i32(log, key::NUM_HITS)?,
        total_misses: req_i32(log, key::NUM_MISSES)?,
        total_duplicates: req_i32(log, key::NUM_DUPLICATES)?,
        total_ships_killed: req_i32(log, key::SHIPS_KILLED)?,
    })
}

fn match_player_to_value(player: &MatchPlayer) -> Value {
    json!({
        (key::AI_NAME): player.ai_name,
        (key::AUTHOR_NAMES): player.author_name,
        (log_key::STATS): match_stats_to_value(&player.stats),
        (log_key::ERROR): fault_to_value(&player.error),
    })
}

fn match_player_from_value(log: &Value) -> Result<MatchPlayer> {
    Ok(MatchPlayer {
        ai_name: req_str(log, key::AI_NAME)?.to_string(),
        author_name: req_str(log, key::AUTHOR_NAMES)?.to_string(),
        stats: match_stats_from_value(req_obj(log, log_key::STATS)?)?,
        error: fault_from_value(req_obj(log, log_key::ERROR)?)?,
    })
}

impl MatchLog {
    pub fn to_value(&self) -> Value {
        json!({
            (key::BOARD_SIZE): self.board_size as i64,
            (log_key::ELAPSED_TIME): self.elapsed_time,
            (key::PLAYER_1): match_player_to_value(&self.player1),
            (key::PLAYER_2): match_player_to_value(&self.player2),
            (log_key::GAMES): self.games.iter().map(GameLog::to_value).collect::<Vec<_>>(),
        })
    }

    pub fn from_value(log: &Value) -> Result<MatchLog> {
        let games = req_arr(log, log_key::GAMES)?
            .iter()
            .map(GameLog::from_value)
            .collect::<Result<Vec<_>>>()?;
        Ok(MatchLog {
            board_size: req_usize(log, key::BOARD_SIZE)?,
            elapsed_time: req_f64(log, log_key::ELAPSED_TIME)?,
            player1: match_player_from_value(req_obj(log, key::PLAYER_1)?)?,
            player2: match_player_from_value(req_obj(log, key::PLAYER_2)?)?,
            games,
        })
    }
}

/* ── contest log ──────────────────────────────────────────────────────── */

fn contest_player_to_value(player: &ContestPlayer) -> Value {
    json!({
        (key::AI_NAME): player.ai_name,
        (key::AUTHOR_NAMES): player.author_name,
        (log_key::LIVES): player.lives,
        (log_key::PLAYED): player.played,
        (log_key::WINS): player.stats.wins,
        (log_key::LOSSES): player.stats.losses,
        (log_key::TIES): player.stats.ties,
        (log_key::TOTAL_WINS): player.stats.total_wins,
        (log_key::TOTAL_LOSSES): player.stats.total_losses,
        (log_key::TOTAL_TIES): player.stats.total_ties,
        (log_key::ERROR): fault_to_value(&player.error),
    })
}

fn contest_player_from_value(log: &Value) -> Result<ContestPlayer> {
    Ok(ContestPlayer {
        ai_name: req_str(log, key::AI_NAME)?.to_string(),
        author_name: req_str(log, key::AUTHOR_NAMES)?.to_string(),
        lives: req_i32(log, log_key::LIVES)?,
        played: req_bool(log, log_key::PLAYED)?,
        stats: ContestStats {
            wins: req_i32(log, log_key::WINS)?,
            losses: req_i32(log, log_key::LOSSES)?,
            ties: req_i32(log, log_key::TIES)?,
            total_wins: req_i32(log, log_key::TOTAL_WINS)?,
            total_losses: req_i32(log, log_key::TOTAL_LOSSES)?,
            total_ties: req_i32(log, log_key::TOTAL_TIES)?,
        },
        executable: Executable::default(),
        error: fault_from_value(req_obj(log, log_key::ERROR)?)?,
    })
}

fn contest_match_player_to_value(player: &ContestMatchPlayer) -> Value {
    json!({
        (log_key::PLAYER_IDX): player.player_idx as i64,
        (key::GAME_RESULT): player.match_result.code(),
        (log_key::STATS): match_stats_to_value(&player.stats),
        (log_key::ERROR): fault_to_value(&player.error),
    })
}

fn contest_match_player_from_value(log: &Value) -> Result<ContestMatchPlayer> {
    let match_result =
        GameResult::from_code(req_i64(log, key::GAME_RESULT)?).context("invalid match result")?;
    Ok(ContestMatchPlayer {
        player_idx: req_usize(log, log_key::PLAYER_IDX)?,
        executable: Executable::default(),
        stats: match_stats_from_value(req_obj(log, log_key::STATS)?)?,
        match_result,
        error: fault_from_value(req_obj(log, log_key::ERROR)?)?,
    })
}

fn contest_match_to_value(m: &ContestMatch) -> Value {
    json!({
        (log_key::ELAPSED_TIME): m.elapsed_time,
        (key::PLAYER_1): contest_match_player_to_value(&m.player1),
        (key::PLAYER_2): contest_match_player_to_value(&m.player2),
        (log_key::LAST_GAME): m.last_game.to_value(),
    })
}

fn contest_match_from_value(log: &Value) -> Result<ContestMatch> {
    Ok(ContestMatch {
        elapsed_time: req_f64(log, log_key::ELAPSED_TIME)?,
        player1: contest_match_player_from_value(req_obj(log, key::PLAYER_1)?)?,
        player2: contest_match_player_from_value(req_obj(log, key::PLAYER_2)?)?,
        last_game: GameLog::from_value(req_obj(log, log_key::LAST_GAME)?)?,
    })
}

fn contest_round_to_value(round: &ContestRound) -> Value {
    json!({
        (log_key::MATCHES): round.matches.iter().map(contest_match_to_value).collect::<Vec<_>>(),
    })
}

fn contest_round_from_value(log: &Value) -> Result<ContestRound> {
    let matches = req_arr(log, log_key::MATCHES)?
        .iter()
        .map(contest_match_from_value)
        .collect::<Result<Vec<_>>>()?;
    Ok(ContestRound { matches })
}

impl ContestLog {
    pub fn to_value(&self) -> Value {
        json!({
            (key::BOARD_SIZE): self.board_size as i64,
            (log_key::PLAYERS): self.players.iter().map(contest_player_to_value).collect::<Vec<_>>(),
            (log_key::ROUNDS): self.rounds.iter().map(contest_round_to_value).collect::<Vec<_>>(),
        })
    }

    pub fn from_value(log: &Value) -> Result<ContestLog> {
        let players = req_arr(log, log_key::PLAYERS)?
            .iter()
            .map(contest_player_from_value)
            .collect::<Result<Vec<_>>>()?;
        let rounds = req_arr(log, log_key::ROUNDS)?
            .iter()
            .map(contest_round_from_value)
            .collect::<Result<Vec<_>>>()?;
        Ok(ContestLog {
            board_size: req_usize(log, key::BOARD_SIZE)?,
            players,
            rounds,
        })
    }
}

/* ── persistence ──────────────────────────────────────────────────────── */

fn save(value: &Value, system_dir: &Path, file_name: &str) -> Result<()> {
    let dir = system_dir.join(LOGS_DIR);
    fs::create_dir_all(&dir).with_context(|| format!("cannot create {dir:?}"))?;
    let path = dir.join(file_name);
    fs::write(&path, format!("{value}\n")).with_context(|| format!("cannot write {path:?}"))
}

fn open(system_dir: &Path, file_name: &str) -> Result<Value> {
    let path = system_dir.join(LOGS_DIR).join(file_name);
    let text =
        fs::read_to_string(&path).with_context(|| format!("{file_name} file doesn't exist"))?;
    serde_json::from_str(&text).with_context(|| format!("invalid JSON found in {file_name} file"))
}

pub fn save_match_log(log: &MatchLog, system_dir: &Path) -> Result<()> {
    save(&log.to_value(), system_dir, MATCH_LOG)
}

pub fn open_match_log(system_dir: &Path) -> Result<MatchLog> {
    MatchLog::from_value(&open(system_dir, MATCH_LOG)?)
        .with_context(|| format!("invalid {MATCH_LOG} file"))
}

pub fn save_contest_log(log: &ContestLog, system_dir: &Path) -> Result<()> {
    save(&log.to_value(), system_dir, CONTEST_LOG)
}

pub fn open_contest_log(system_dir: &Path) -> Result<ContestLog> {
    ContestLog::from_value(&open(system_dir, CONTEST_LOG)?)
        .with_context(|| format!("invalid {CONTEST_LOG} file"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_game() -> GameLog {
        let ship = Ship {
            row: 0,
            col: 0,
            len: 2,
            dir: Direction::Horizontal,
            alive: false,
        };
        let mut hit = Shot::new(0, 0);
        hit.value = BoardValue::Hit;
        let mut kill = Shot::new(0, 1);
        kill.value = BoardValue::Kill;
        kill.ship_sunk_idx = 0;

        let mut game = GameLog::default();
        game.player1.ships.push(ship);
        game.player2.shots.push(hit);
        game.player2.shots.push(kill);
        game.player2.stats = GameStats {
            num_board_shot: 2,
            hits: 2,
            misses: 0,
            duplicates: 0,
            ships_killed: 1,
            result: GameResult::Win,
        };
        game.player1.stats.result = GameResult::Loss;
        game
    }

    fn sample_match() -> MatchLog {
        MatchLog {
            board_size: 10,
            elapsed_time: 1.234,
            player1: MatchPlayer {
                ai_name: "alpha".into(),
                author_name: "someone".into(),
                stats: MatchStats {
                    wins: 1,
                    ..MatchStats::default()
                },
                error: None,
            },
            player2: MatchPlayer {
                ai_name: "beta".into(),
                author_name: "someone else".into(),
                stats: MatchStats {
                    losses: 1,
                    ..MatchStats::default()
                },
                error: Some(PeerFault::ShipOffBoard(Ship {
                    row: 0,
                    col: 8,
                    len: 3,
                    dir: Direction::Horizontal,
                    alive: false,
                })),
            },
            games: vec![sample_game()],
        }
    }

    #[test]
    fn match_log_round_trips() {
        let log = sample_match();
        let value = log.to_value();
        let back = MatchLog::from_value(&value).unwrap();
        // everything that is serialized comes back bit-identical
        assert_eq!(back.to_value(), value);
        assert_eq!(back.board_size, 10);
        assert_eq!(back.player2.error, log.player2.error);
        assert_eq!(back.games[0].player2.shots[1].ship_sunk_idx, 0);
    }

    #[test]
    fn sid_defaults_to_no_sink() {
        let value = json!({ "r": 3, "c": 4, "v": BoardValue::Miss.code() });
        let shot = shot_from_value(&value).unwrap();
        assert_eq!(shot.ship_sunk_idx, -1);
    }

    #[test]
    fn missing_key_rejects_whole_log() {
        let mut value = sample_match().to_value();
        value.as_object_mut().unwrap().remove("et");
        assert!(MatchLog::from_value(&value).is_err());
    }

    #[test]
    fn wrong_type_rejects_whole_log() {
        let mut value = sample_match().to_value();
        value["bs"] = json!("ten");
        assert!(MatchLog::from_value(&value).is_err());

        // elapsed time must be a float, not an integer
        let mut value = sample_match().to_value();
        value["et"] = json!(2);
        assert!(MatchLog::from_value(&value).is_err());
    }

    #[test]
    fn message_fault_round_trips_with_payload() {
        let fault = Some(PeerFault::HelloMessage("not json at all".into()));
        let back = fault_from_value(&fault_to_value(&fault)).unwrap();
        assert_eq!(back, fault);

        let none = fault_from_value(&fault_to_value(&None)).unwrap();
        assert_eq!(none, None);
    }

    #[test]
    fn contest_log_round_trips() {
        let mut contest = ContestLog {
            board_size: 5,
            ..ContestLog::default()
        };
        contest.players.push(ContestPlayer {
            ai_name: "alpha".into(),
            author_name: "a".into(),
            lives: 3,
            played: true,
            stats: ContestStats {
                wins: 2,
                total_wins: 7,
                ..ContestStats::default()
            },
            executable: Executable::default(),
            error: None,
        });
        contest.players.push(ContestPlayer {
            ai_name: "broken".into(),
            author_name: String::new(),
            lives: 0,
            played: false,
            stats: ContestStats::default(),
            executable: Executable::default(),
            error: Some(PeerFault::Fork),
        });
        contest.rounds.push(ContestRound {
            matches: vec![ContestMatch {
                elapsed_time: 0.25,
                player1: ContestMatchPlayer {
                    player_idx: 0,
                    match_result: GameResult::Win,
                    ..ContestMatchPlayer::default()
                },
                player2: ContestMatchPlayer {
                    player_idx: 1,
                    match_result: GameResult::Loss,
                    error: Some(PeerFault::Receive),
                    ..ContestMatchPlayer::default()
                },
                last_game: sample_game(),
            }],
        });

        let value = contest.to_value();
        let back = ContestLog::from_value(&value).unwrap();
        assert_eq!(back.to_value(), value);
        assert_eq!(back.players[1].error, Some(PeerFault::Fork));
        assert_eq!(back.rounds[0].matches[0].player1.match_result, GameResult::Win);
    }

    #[test]
    fn save_and_open_files() {
        let dir = tempfile::tempdir().unwrap();
        let log = sample_match();
        save_match_log(&log, dir.path()).unwrap();
        let back = open_match_log(dir.path()).unwrap();
        assert_eq!(back.to_value(), log.to_value());

        assert!(open_contest_log(dir.path()).is_err()); // not written yet

        let contest = ContestLog {
            board_size: 7,
            ..ContestLog::default()
        };
        save_contest_log(&contest, dir.path()).unwrap();
        assert_eq!(open_contest_log(dir.path()).unwrap().board_size, 7);
    }
}
