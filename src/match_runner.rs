//! A match: a fixed-count series of games between one pair of AIs.
//!
//! The match engine owns the whole peer lifecycle: spawn and accept both
//! processes, exchange Hello/SetupMatch, reuse one board pair across every
//! game, fold each game's stats into the match totals, and route the
//! MatchOver termination by who (if anyone) faulted last. A peer fault in
//! any game ends the match early; the remaining games are never played.

use std::time::Instant;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use tracing::{instrument, trace, warn};

use crate::board::Board;
use crate::game::{self, ship_schedule};
use crate::logs::{GamePlayer, MatchLog, MatchPlayer};
use crate::options::MatchOptions;
use crate::protocol;
use crate::transport::{Endpoint, Peer};
use crate::types::{FaultStatus, GameResult, PlayerNum};

/// Run one match and return its log. Only controller-side misconfiguration
/// (an unhandled board size) is an `Err`; every peer problem lands in the
/// log instead.
#[instrument(skip_all, fields(p1 = %options.exec1.file_name, p2 = %options.exec2.file_name))]
pub fn run_match(
    endpoint: &Endpoint,
    options: &MatchOptions,
    rng: &mut StdRng,
) -> Result<MatchLog> {
    let schedule = ship_schedule(options.board_size)
        .with_context(|| format!("unhandled board size {}", options.board_size))?;

    let mut match_log = MatchLog {
        board_size: options.board_size,
        elapsed_time: 0.0,
        player1: MatchPlayer {
            ai_name: options.exec1.file_name.clone(),
            ..MatchPlayer::default()
        },
        player2: MatchPlayer {
            ai_name: options.exec2.file_name.clone(),
            ..MatchPlayer::default()
        },
        games: Vec::new(),
    };
    let start = Instant::now();
    trace!("match started");

    let Some((mut p1, mut p2)) = start_players(&mut match_log, endpoint, options) else {
        store_elapsed(&mut match_log, start);
        return Ok(match_log);
    };

    let status = handle_start_match(&mut match_log, &mut p1, &mut p2);
    if !status.is_clear() {
        handle_match_over(p1, p2, status);
        store_elapsed(&mut match_log, start);
        return Ok(match_log);
    }

    let mut board = Board::new(options.board_size);
    let mut last_status = FaultStatus::Clear;
    for game_number in 0..options.num_games {
        let game = game::run_game(&mut p1, &mut p2, &mut board, &schedule, rng);
        fold_game(&mut match_log.player1, &game.player1);
        fold_game(&mut match_log.player2, &game.player2);
        last_status = FaultStatus::of(&game.player1.error, &game.player2.error);
        match_log.games.push(game);
        if !last_status.is_clear() {
            warn!(game_number, "match stopped early on a peer fault");
            break;
        }
    }

    handle_match_over(p1, p2, last_status);
    store_elapsed(&mut match_log, start);
    trace!("match end");
    Ok(match_log)
}

/// Spawn and accept both peers, player 1 first. If either side fails, the
/// other is killed and the match is over before it began; setup failures
/// deliberately leave the game counters untouched.
fn start_players(
    match_log: &mut MatchLog,
    endpoint: &Endpoint,
    options: &MatchOptions,
) -> Option<(Peer, Peer)> {
    let started1 = endpoint.spawn_and_accept(&options.exec1.exec);
    let started2 = endpoint.spawn_and_accept(&options.exec2.exec);
    match_log.player1.error = started1.as_ref().err().cloned();
    match_log.player2.error = started2.as_ref().err().cloned();

    match (started1, started2) {
        (Ok(p1), Ok(p2)) => Some((p1, p2)),
        (Ok(mut p1), Err(_)) => {
            p1.force_kill();
            None
        }
        (Err(_), Ok(mut p2)) => {
            p2.force_kill();
            None
        }
        (Err(_), Err(_)) => None,
    }
}

fn check_match_faults(match_log: &MatchLog) -> FaultStatus {
    FaultStatus::of(&match_log.player1.error, &match_log.player2.error)
}

/// Receive both Hellos, record the AI names, and send each peer its seat.
fn handle_start_match(match_log: &mut MatchLog, p1: &mut Peer, p2: &mut Peer) -> FaultStatus {
    let recv1 = p1.recv();
    let recv2 = p2.recv();
    match_log.player1.error = recv1.as_ref().err().cloned();
    match_log.player2.error = recv2.as_ref().err().cloned();
    let status = check_match_faults(match_log);
    let (Ok(text1), Ok(text2)) = (recv1, recv2) else {
        return status;
    };

    let hello1 = protocol::parse_hello_msg(&text1);
    let hello2 = protocol::parse_hello_msg(&text2);
    match_log.player1.error = hello1.as_ref().err().cloned();
    match_log.player2.error = hello2.as_ref().err().cloned();
    let status = check_match_faults(match_log);
    let (Ok(hello1), Ok(hello2)) = (hello1, hello2) else {
        return status;
    };
    match_log.player1.ai_name = hello1.ai_name;
    match_log.player1.author_name = hello1.author_name;
    match_log.player2.ai_name = hello2.ai_name;
    match_log.player2.author_name = hello2.author_name;

    let board_size = match_log.board_size;
    match_log.player1.error = p1
        .send(&protocol::setup_match_msg(board_size, PlayerNum::One))
        .err();
    match_log.player2.error = p2
        .send(&protocol::setup_match_msg(board_size, PlayerNum::Two))
        .err();
    check_match_faults(match_log)
}

/// Fold one game into the match totals. The game's error (usually none)
/// becomes the player's current match error.
fn fold_game(match_player: &mut MatchPlayer, game_player: &GamePlayer) {
    match_player.error = game_player.error.clone();

    let totals = &mut match_player.stats;
    let game_stats = &game_player.stats;
    totals.total_num_board_shot += game_stats.num_board_shot;
    totals.total_hits += game_stats.hits;
    totals.total_misses += game_stats.misses;
    totals.total_duplicates += game_stats.duplicates;
    totals.total_ships_killed += game_stats.ships_killed;

    match game_stats.result {
        GameResult::Win => totals.wins += 1,
        GameResult::Loss => totals.losses += 1,
        GameResult::Tie => totals.ties += 1,
    }
}

/// End the match. A healthy peer gets MatchOver and a grace period to exit
/// on its own; a faulty peer is killed on the spot.
fn handle_match_over(mut p1: Peer, mut p2: Peer, last_status: FaultStatus) {
    let msg = protocol::match_over_msg();
    match last_status {
        FaultStatus::Both => {
            p1.force_kill();
            p2.force_kill();
        }
        FaultStatus::PlayerTwo => {
            let _ = p1.send(&msg);
            p1.wait_for_exit();
            p2.force_kill();
        }
        FaultStatus::PlayerOne => {
            p1.force_kill();
            let _ = p2.send(&msg);
            p2.wait_for_exit();
        }
        FaultStatus::Clear => {
            let _ = p1.send(&msg);
            let _ = p2.send(&msg);
            p1.wait_for_exit();
            p2.wait_for_exit();
        }
    }
}

fn store_elapsed(match_log: &mut MatchLog, start: Instant) {
    // millisecond precision is plenty for a wall-clock figure
    match_log.elapsed_time = start.elapsed().as_millis() as f64 / 1000.0;
}
