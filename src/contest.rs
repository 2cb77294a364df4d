//! The contest engine: an elimination tournament with lives.
//!
//! Every entrant first passes a wake-up probe (spawn, one Hello, kill).
//! Rounds then repeat until at most one player is left alive: the living
//! players are paired uniformly at random, each pair plays a match, and the
//! loser of a match (both sides, on a tie) pays a life. A peer fault in a
//! match zeroes the offender's lives outright; one broken AI cannot stall
//! the rest of the field.

use std::io::Write;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::Rng;
use tracing::{info, instrument, warn};

use crate::logs::{ContestLog, ContestMatch, ContestMatchPlayer, ContestPlayer, ContestRound};
use crate::match_runner::run_match;
use crate::options::{ContestOptions, MatchDisplayType, MatchOptions};
use crate::protocol;
use crate::transport::Endpoint;
use crate::types::GameResult;

const STARTING_LIVES: i32 = 3;

/// Run a whole contest and return its log.
pub fn run_contest(
    endpoint: &Endpoint,
    options: &ContestOptions,
    rng: &mut StdRng,
) -> Result<ContestLog> {
    let mut contest = ContestLog {
        board_size: options.board_size,
        players: Vec::new(),
        rounds: Vec::new(),
    };

    initialize_players(&mut contest, endpoint, options);
    run_rounds(&mut contest, endpoint, options, rng)?;
    Ok(contest)
}

/// Probe every entrant once. Failures keep the player in the log (so the
/// final standings show everyone who signed up) but with no lives to play.
fn initialize_players(contest: &mut ContestLog, endpoint: &Endpoint, options: &ContestOptions) {
    for exec in &options.execs {
        let mut player = ContestPlayer {
            ai_name: exec.file_name.clone(),
            author_name: String::new(),
            lives: STARTING_LIVES,
            played: true,
            stats: Default::default(),
            executable: exec.clone(),
            error: None,
        };

        wake_up_probe(endpoint, &mut player);
        if let Some(fault) = &player.error {
            warn!(ai = %exec.file_name, %fault, "wake-up probe failed");
            eprintln!(
                "\n{} failed a basic test. They will not participate in the contest.",
                exec.file_name
            );
            player.lives = 0;
            player.played = false;
            player.ai_name = exec.file_name.clone();
        }
        contest.players.push(player);
    }
}

/// Spawn the player, expect exactly one Hello, and kill it again. The
/// transient process never sees a SetupMatch.
#[instrument(skip_all, fields(exec = %player.executable.file_name))]
fn wake_up_probe(endpoint: &Endpoint, player: &mut ContestPlayer) {
    let mut peer = match endpoint.spawn_and_accept(&player.executable.exec) {
        Ok(peer) => peer,
        Err(fault) => {
            player.error = Some(fault);
            return;
        }
    };

    match peer.recv() {
        Err(fault) => player.error = Some(fault),
        Ok(text) => match protocol::parse_hello_msg(&text) {
            Err(fault) => player.error = Some(fault),
            Ok(hello) => {
                player.ai_name = hello.ai_name;
                player.author_name = hello.author_name;
            }
        },
    }
    peer.force_kill();
}

/// Round loop: pair up the living, play every pair, account the results.
/// Public so a contest can be resumed or driven over a hand-built player
/// list (which is also how the probe-less paths are tested).
pub fn run_rounds(
    contest: &mut ContestLog,
    endpoint: &Endpoint,
    options: &ContestOptions,
    rng: &mut StdRng,
) -> Result<()> {
    loop {
        let alive: Vec<usize> = contest
            .players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.lives > 0)
            .map(|(idx, _)| idx)
            .collect();
        if alive.len() <= 1 {
            break;
        }

        let pairs = random_pairings(alive, rng);
        if pairs.is_empty() {
            break;
        }

        let round_number = contest.rounds.len() + 1;
        info!(round_number, matches = pairs.len(), "running contest round");
        print!("\nRunning Round #{round_number}");
        let _ = std::io::stdout().flush();

        let mut round = ContestRound::default();
        for (idx1, idx2) in pairs {
            print!(".");
            let _ = std::io::stdout().flush();

            let contest_match = run_contest_match(contest, endpoint, options, idx1, idx2, rng)?;
            absorb_match_result(&mut contest.players[idx1], &contest_match.player1);
            absorb_match_result(&mut contest.players[idx2], &contest_match.player2);
            round.matches.push(contest_match);
        }
        println!();

        contest.rounds.push(round);
    }
    Ok(())
}

/// Draw pairs uniformly without replacement. With an odd pool one player is
/// left over and simply sits the round out.
fn random_pairings(mut pool: Vec<usize>, rng: &mut StdRng) -> Vec<(usize, usize)> {
    let mut pairs = Vec::with_capacity(pool.len() / 2);
    while pool.len() > 1 {
        let first = pool.remove(rng.random_range(0..pool.len()));
        let second = pool.remove(rng.random_range(0..pool.len()));
        pairs.push((first, second));
    }
    pairs
}

fn run_contest_match(
    contest: &ContestLog,
    endpoint: &Endpoint,
    options: &ContestOptions,
    idx1: usize,
    idx2: usize,
    rng: &mut StdRng,
) -> Result<ContestMatch> {
    let exec1 = contest.players[idx1].executable.clone();
    let exec2 = contest.players[idx2].executable.clone();
    let match_options = MatchOptions {
        board_size: options.board_size,
        num_games: options.num_games,
        display_type: MatchDisplayType::default(),
        exec1: exec1.clone(),
        exec2: exec2.clone(),
    };

    let match_log = run_match(endpoint, &match_options, rng)?;

    let mut player1 = ContestMatchPlayer {
        player_idx: idx1,
        executable: exec1,
        stats: match_log.player1.stats,
        match_result: GameResult::Tie,
        error: match_log.player1.error.clone(),
    };
    let mut player2 = ContestMatchPlayer {
        player_idx: idx2,
        executable: exec2,
        stats: match_log.player2.stats,
        match_result: GameResult::Tie,
        error: match_log.player2.error.clone(),
    };
    decide_match_result(&mut player1, &mut player2);

    Ok(ContestMatch {
        elapsed_time: match_log.elapsed_time,
        player1,
        player2,
        last_game: match_log.games.last().cloned().unwrap_or_default(),
    })
}

/// A match is won on game wins. Equal wins with exactly one faulty side is
/// a loss for the faulty side; equal wins otherwise is a tie for both.
fn decide_match_result(player1: &mut ContestMatchPlayer, player2: &mut ContestMatchPlayer) {
    use std::cmp::Ordering;

    let (result1, result2) = match player1.stats.wins.cmp(&player2.stats.wins) {
        Ordering::Greater => (GameResult::Win, GameResult::Loss),
        Ordering::Less => (GameResult::Loss, GameResult::Win),
        Ordering::Equal => match (player1.error.is_some(), player2.error.is_some()) {
            (true, false) => (GameResult::Loss, GameResult::Win),
            (false, true) => (GameResult::Win, GameResult::Loss),
            _ => (GameResult::Tie, GameResult::Tie),
        },
    };
    player1.match_result = result1;
    player2.match_result = result2;
}

/// Fold one match into a player's contest record. A loss costs a life, a
/// tie costs both players a life, and any fault empties the tank.
fn absorb_match_result(player: &mut ContestPlayer, match_player: &ContestMatchPlayer) {
    match match_player.match_result {
        GameResult::Win => player.stats.wins += 1,
        GameResult::Loss => {
            player.stats.losses += 1;
            player.lives -= 1;
        }
        GameResult::Tie => {
            player.stats.ties += 1;
            player.lives -= 1;
        }
    }
    player.stats.total_wins += match_player.stats.wins;
    player.stats.total_losses += match_player.stats.losses;
    player.stats.total_ties += match_player.stats.ties;

    player.error = match_player.error.clone();
    if player.error.is_some() {
        player.lives = 0;
    }
}
