//! Runtime options and the filesystem surface around them.
//!
//! The interactive menu that asks the user what to run is an external
//! collaborator; its hand-off to the controller is `./options.json` plus the
//! `./ai_files/` directory. This module reads both, validates them, and
//! produces the [`Options`] value the engines consume. Anything wrong here
//! is a fatal setup failure (process exit code 1), never a peer fault.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tracing::{info, warn};

/// Directory of candidate AI executables, relative to the working directory.
pub const EXEC_DIR: &str = "ai_files";
/// Instructor-provided AIs live one level deeper.
pub const PROTECT_DIR: &str = "protected";
/// The controller's listening socket, created in the working directory.
pub const SOCKET_NAME: &str = "battleships.socket";
/// Runtime option defaults written by the menu collaborator.
pub const OPTIONS_FILE: &str = "options.json";

const DEFAULT_BOARD_SIZE: usize = 10;
const DEFAULT_NUM_GAMES: usize = 500;
const MAX_NUM_GAMES: usize = 10_000;

/// One candidate AI: the name shown in logs and the path handed to exec.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Executable {
    pub file_name: String,
    pub exec: PathBuf,
}

/// How much of a match the display collaborator should render. Carried
/// through untouched by the engines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchDisplayType {
    #[default]
    Last,
    All,
    EachType,
    Increment,
    Choice,
    None,
}

/// Contest rendering granularity for the display collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContestDisplayType {
    #[default]
    Normal,
    Rounds,
    Final,
}

#[derive(Debug, Clone)]
pub struct MatchOptions {
    pub board_size: usize,
    pub num_games: usize,
    pub display_type: MatchDisplayType,
    pub exec1: Executable,
    pub exec2: Executable,
}

#[derive(Debug, Clone)]
pub struct ContestOptions {
    pub board_size: usize,
    pub num_games: usize,
    pub display_type: ContestDisplayType,
    pub execs: Vec<Executable>,
}

/// What this run of the controller should do.
#[derive(Debug, Clone)]
pub enum Options {
    RunMatch(MatchOptions),
    RunContest(ContestOptions),
    ReplayMatch,
    ReplayContest,
}

/* ── executable discovery ─────────────────────────────────────────────── */

/// Every regular file with the user-execute bit under `./ai_files/` and
/// `./ai_files/protected/` is a candidate AI. A missing `ai_files/` is
/// fatal; a missing `protected/` just means no instructor AIs.
pub fn discover_executables(system_dir: &Path) -> Result<Vec<Executable>> {
    let exec_dir = system_dir.join(EXEC_DIR);
    if !exec_dir.is_dir() {
        bail!("cannot open {}/ directory", EXEC_DIR);
    }

    let mut execs = Vec::new();
    let protect_dir = exec_dir.join(PROTECT_DIR);
    if protect_dir.is_dir() {
        collect_executables(&protect_dir, &mut execs)?;
    } else {
        warn!("no {}/{}/ directory", EXEC_DIR, PROTECT_DIR);
    }
    collect_executables(&exec_dir, &mut execs)?;

    info!(count = execs.len(), "AI executables discovered");
    Ok(execs)
}

fn collect_executables(dir: &Path, out: &mut Vec<Executable>) -> Result<()> {
    let mut found = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("cannot read {dir:?}"))? {
        let entry = entry.with_context(|| format!("cannot read an entry of {dir:?}"))?;
        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(_) => continue,
        };
        if !metadata.is_file() || metadata.permissions().mode() & 0o100 == 0 {
            continue;
        }
        let Ok(file_name) = entry.file_name().into_string() else {
            warn!("skipping non-UTF8 file name in {dir:?}");
            continue;
        };
        found.push(Executable {
            file_name,
            exec: entry.path(),
        });
    }
    // directory order is arbitrary; sort so contest player indices are stable
    found.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    out.append(&mut found);
    Ok(())
}

/* ── options.json ─────────────────────────────────────────────────────── */

/// Read `./options.json` (missing file means all defaults) and resolve it
/// against the discovered executables.
pub fn load_options(system_dir: &Path) -> Result<Options> {
    let path = system_dir.join(OPTIONS_FILE);
    let value: Value = if path.exists() {
        let text =
            fs::read_to_string(&path).with_context(|| format!("cannot read {OPTIONS_FILE}"))?;
        serde_json::from_str(&text)
            .with_context(|| format!("invalid JSON found in {OPTIONS_FILE} file"))?
    } else {
        Value::Object(serde_json::Map::new())
    };

    let runtime = match value.get("runtime") {
        None => 0,
        Some(v) => v
            .as_i64()
            .with_context(|| format!("non-integer 'runtime' in {OPTIONS_FILE}"))?,
    };

    match runtime {
        0 => Ok(Options::RunMatch(match_options(system_dir, value.get("match"))?)),
        1 => Ok(Options::RunContest(contest_options(
            system_dir,
            value.get("contest"),
        )?)),
        2 => Ok(Options::ReplayMatch),
        3 => Ok(Options::ReplayContest),
        other => bail!("unknown runtime option {other}"),
    }
}

fn board_size_option(section: Option<&Value>) -> Result<usize> {
    let size = match section.and_then(|s| s.get("board_size")) {
        None => DEFAULT_BOARD_SIZE,
        Some(v) => v
            .as_u64()
            .context("non-integer 'board_size'")
            .and_then(|n| usize::try_from(n).context("board_size out of range"))?,
    };
    if !(crate::board::MIN_BOARD_SIZE..=crate::board::MAX_BOARD_SIZE).contains(&size) {
        bail!(
            "board_size must be between {} and {}",
            crate::board::MIN_BOARD_SIZE,
            crate::board::MAX_BOARD_SIZE
        );
    }
    Ok(size)
}

fn num_games_option(section: Option<&Value>) -> Result<usize> {
    let games = match section.and_then(|s| s.get("games_per_match")) {
        None => DEFAULT_NUM_GAMES,
        Some(v) => v
            .as_u64()
            .context("non-integer 'games_per_match'")
            .and_then(|n| usize::try_from(n).context("games_per_match out of range"))?,
    };
    if games == 0 || games > MAX_NUM_GAMES {
        bail!("games_per_match must be between 1 and {MAX_NUM_GAMES}");
    }
    Ok(games)
}

fn pick_executable(execs: &[Executable], name: Option<&Value>, fallback: usize) -> Result<Executable> {
    match name {
        Some(v) => {
            let name = v.as_str().context("player name is not a string")?;
            execs
                .iter()
                .find(|e| e.file_name == name)
                .cloned()
                .with_context(|| format!("no AI named '{name}' under {EXEC_DIR}/"))
        }
        None => execs
            .get(fallback)
            .cloned()
            .with_context(|| format!("need at least {} AIs under {EXEC_DIR}/", fallback + 1)),
    }
}

fn match_options(system_dir: &Path, section: Option<&Value>) -> Result<MatchOptions> {
    let execs = discover_executables(system_dir)?;
    Ok(MatchOptions {
        board_size: board_size_option(section)?,
        num_games: num_games_option(section)?,
        display_type: MatchDisplayType::default(),
        exec1: pick_executable(&execs, section.and_then(|s| s.get("player_1")), 0)?,
        exec2: pick_executable(&execs, section.and_then(|s| s.get("player_2")), 1)?,
    })
}

fn contest_options(system_dir: &Path, section: Option<&Value>) -> Result<ContestOptions> {
    let execs = discover_executables(system_dir)?;
    if execs.len() < 2 {
        bail!("a contest needs at least two AIs under {EXEC_DIR}/");
    }
    Ok(ContestOptions {
        board_size: board_size_option(section)?,
        num_games: num_games_option(section)?,
        display_type: ContestDisplayType::default(),
        execs,
    })
}
