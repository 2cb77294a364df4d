//! End-to-end matches against the shipped reference AIs, spawned as real
//! child processes over a real Unix socket.

use std::path::PathBuf;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;

use battleships_controller::logs::{open_match_log, save_match_log, GamePlayer, MatchLog};
use battleships_controller::match_runner::run_match;
use battleships_controller::options::{Executable, MatchDisplayType, MatchOptions};
use battleships_controller::transport::Endpoint;
use battleships_controller::types::{ErrorType, PeerFault};

fn sample_ai() -> Executable {
    Executable {
        file_name: "sample_ai".into(),
        exec: PathBuf::from(env!("CARGO_BIN_EXE_sample_ai")),
    }
}

fn sleepy_ai() -> Executable {
    Executable {
        file_name: "sleepy_ai".into(),
        exec: PathBuf::from(env!("CARGO_BIN_EXE_sleepy_ai")),
    }
}

fn broken_ai() -> Executable {
    Executable {
        file_name: "broken_ai".into(),
        exec: PathBuf::from("/nonexistent/broken_ai"),
    }
}

fn play(board_size: usize, num_games: usize, exec1: Executable, exec2: Executable) -> MatchLog {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = Endpoint::create(&dir.path().join("battleships.socket"), false).unwrap();
    let mut rng = StdRng::seed_from_u64(42);
    let options = MatchOptions {
        board_size,
        num_games,
        display_type: MatchDisplayType::default(),
        exec1,
        exec2,
    };
    run_match(&endpoint, &options, &mut rng).unwrap()
}

fn assert_game_invariants(player: &GamePlayer, opponent: &GamePlayer) {
    let stats = &player.stats;
    assert_eq!(
        stats.hits + stats.misses + stats.duplicates,
        player.shots.len() as i32,
        "every shot is a hit, a miss, or a duplicate"
    );
    assert_eq!(stats.num_board_shot, stats.hits + stats.misses);
    // kills credited to this player are ships dead on the opponent's side
    let opponent_dead = opponent.ships.iter().filter(|s| !s.alive).count() as i32;
    assert_eq!(stats.ships_killed, opponent_dead);
    assert!(stats.ships_killed <= opponent.ships.len() as i32);
}

#[test]
fn clean_match_aggregates_its_games() {
    let log = play(10, 3, sample_ai(), sample_ai());

    assert_eq!(log.games.len(), 3);
    assert!(log.player1.error.is_none());
    assert!(log.player2.error.is_none());
    assert_eq!(log.player1.ai_name, "Sample AI");
    assert!(log.elapsed_time > 0.0);

    let mut totals1 = (0, 0, 0, 0, 0);
    for game in &log.games {
        assert_eq!(game.player1.ships.len(), 6); // 10x10 schedule
        assert_eq!(game.player2.ships.len(), 6);
        assert_game_invariants(&game.player1, &game.player2);
        assert_game_invariants(&game.player2, &game.player1);
        let s = &game.player1.stats;
        totals1 = (
            totals1.0 + s.num_board_shot,
            totals1.1 + s.hits,
            totals1.2 + s.misses,
            totals1.3 + s.duplicates,
            totals1.4 + s.ships_killed,
        );
    }

    // match totals are the componentwise sum over games
    let m = &log.player1.stats;
    assert_eq!(
        (
            m.total_num_board_shot,
            m.total_hits,
            m.total_misses,
            m.total_duplicates,
            m.total_ships_killed
        ),
        totals1
    );
    assert_eq!(m.wins + m.losses + m.ties, 3);

    // opposing results mirror each other in every game
    for game in &log.games {
        use battleships_controller::types::GameResult::*;
        let pair = (game.player1.stats.result, game.player2.stats.result);
        assert!(matches!(pair, (Win, Loss) | (Loss, Win) | (Tie, Tie)));
    }
}

#[test]
fn smallest_board_plays_through() {
    let log = play(3, 1, sample_ai(), sample_ai());
    assert_eq!(log.games.len(), 1);
    let game = &log.games[0];
    assert_eq!(game.player1.ships.len(), 3); // 3x3 schedule
    for player in [&game.player1, &game.player2] {
        // a 3x3 game fits in at most nine shot rounds
        assert!(player.shots.len() <= 9);
        // the sample AI never repeats a shot
        assert_eq!(player.stats.duplicates, 0);
    }
    assert_game_invariants(&game.player1, &game.player2);
    assert_game_invariants(&game.player2, &game.player1);
}

#[test]
fn match_log_survives_the_disk() {
    let dir = tempfile::tempdir().unwrap();
    let log = play(5, 2, sample_ai(), sample_ai());
    save_match_log(&log, dir.path()).unwrap();
    let back = open_match_log(dir.path()).unwrap();
    assert_eq!(back.to_value(), log.to_value());
}

#[test]
fn unresponsive_peer_times_out_and_forfeits() {
    let start = Instant::now();
    let log = play(10, 5, sample_ai(), sleepy_ai());

    // sleepy passed the hello but never placed a ship
    assert_eq!(
        log.player2.error.as_ref().map(PeerFault::error_type),
        Some(ErrorType::ErrReceive)
    );
    assert!(log.player1.error.is_none());

    // one aborted game, winner by forfeit, and no further games played
    assert_eq!(log.games.len(), 1);
    assert_eq!(log.player1.stats.wins, 1);
    assert_eq!(log.player2.stats.losses, 1);

    // the 500ms deadline means the whole thing is quick
    assert!(start.elapsed().as_secs() < 10);
}

#[test]
fn spawn_failure_ends_the_match_before_any_game() {
    let log = play(10, 5, sample_ai(), broken_ai());

    assert_eq!(
        log.player2.error.as_ref().map(PeerFault::error_type),
        Some(ErrorType::ErrFork)
    );
    assert!(log.player1.error.is_none());
    assert!(log.games.is_empty());

    // setup failures never mint game results
    for player in [&log.player1, &log.player2] {
        let s = &player.stats;
        assert_eq!((s.wins, s.losses, s.ties), (0, 0, 0));
    }
}

#[test]
fn both_spawn_failures_leave_two_faults() {
    let log = play(10, 1, broken_ai(), broken_ai());
    assert_eq!(
        log.player1.error.as_ref().map(PeerFault::error_type),
        Some(ErrorType::ErrFork)
    );
    assert_eq!(
        log.player2.error.as_ref().map(PeerFault::error_type),
        Some(ErrorType::ErrFork)
    );
    assert!(log.games.is_empty());
}
