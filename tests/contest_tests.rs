//! Contest engine tests: wake-up probes, rounds, lives, and the log file,
//! all against the shipped reference AIs.

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::SeedableRng;

use battleships_controller::contest::{run_contest, run_rounds};
use battleships_controller::logs::{
    open_contest_log, save_contest_log, ContestLog, ContestPlayer,
};
use battleships_controller::options::{ContestDisplayType, ContestOptions, Executable};
use battleships_controller::transport::Endpoint;
use battleships_controller::types::{ErrorType, GameResult, PeerFault};

fn sample_exec(name: &str) -> Executable {
    Executable {
        file_name: name.into(),
        exec: PathBuf::from(env!("CARGO_BIN_EXE_sample_ai")),
    }
}

fn broken_exec() -> Executable {
    Executable {
        file_name: "broken_ai".into(),
        exec: PathBuf::from("/nonexistent/broken_ai"),
    }
}

fn contest_options(execs: Vec<Executable>) -> ContestOptions {
    ContestOptions {
        board_size: 5,
        num_games: 1,
        display_type: ContestDisplayType::default(),
        execs,
    }
}

#[test]
fn spawn_failure_inside_a_contest_match() {
    // two entrants already past the probe, one of which will fail to start
    let mut contest = ContestLog {
        board_size: 10,
        players: vec![
            ContestPlayer {
                ai_name: "healthy".into(),
                lives: 3,
                played: true,
                executable: sample_exec("healthy"),
                ..ContestPlayer::default()
            },
            ContestPlayer {
                ai_name: "broken".into(),
                lives: 3,
                played: true,
                executable: broken_exec(),
                ..ContestPlayer::default()
            },
        ],
        rounds: Vec::new(),
    };

    let dir = tempfile::tempdir().unwrap();
    let endpoint = Endpoint::create(&dir.path().join("battleships.socket"), false).unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    let options = ContestOptions {
        board_size: 10,
        num_games: 3,
        display_type: ContestDisplayType::default(),
        execs: Vec::new(),
    };
    run_rounds(&mut contest, &endpoint, &options, &mut rng).unwrap();

    assert_eq!(contest.rounds.len(), 1);
    let round_match = &contest.rounds[0].matches[0];
    let (healthy, broken) = if round_match.player1.player_idx == 0 {
        (&round_match.player1, &round_match.player2)
    } else {
        (&round_match.player2, &round_match.player1)
    };

    // no game was ever played, yet the match is decided against the fault
    assert_eq!((healthy.stats.wins, healthy.stats.losses, healthy.stats.ties), (0, 0, 0));
    assert_eq!(healthy.match_result, GameResult::Win);
    assert_eq!(broken.match_result, GameResult::Loss);
    assert_eq!(
        broken.error.as_ref().map(PeerFault::error_type),
        Some(ErrorType::ErrFork)
    );

    let broken_player = &contest.players[1];
    assert_eq!(broken_player.lives, 0);
    assert!(broken_player.played);
    assert_eq!(
        broken_player.error.as_ref().map(PeerFault::error_type),
        Some(ErrorType::ErrFork)
    );

    let healthy_player = &contest.players[0];
    assert_eq!(healthy_player.lives, 3);
    assert_eq!(healthy_player.stats.wins, 1);
}

#[test]
fn failed_probe_keeps_the_player_in_the_log() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = Endpoint::create(&dir.path().join("battleships.socket"), false).unwrap();
    let mut rng = StdRng::seed_from_u64(2);

    let contest = run_contest(
        &endpoint,
        &contest_options(vec![sample_exec("alpha"), broken_exec(), sample_exec("beta")]),
        &mut rng,
    )
    .unwrap();

    assert_eq!(contest.players.len(), 3);
    let broken = &contest.players[1];
    assert!(!broken.played);
    assert_eq!(broken.lives, 0);
    assert_eq!(
        broken.error.as_ref().map(PeerFault::error_type),
        Some(ErrorType::ErrFork)
    );
    // it never played, so it never appears in a pairing
    for round in &contest.rounds {
        for m in &round.matches {
            assert_ne!(m.player1.player_idx, 1);
            assert_ne!(m.player2.player_idx, 1);
        }
    }
}

#[test]
fn evenly_matched_pair_grinds_down_to_a_double_elimination() {
    let dir = tempfile::tempdir().unwrap();
    let endpoint = Endpoint::create(&dir.path().join("battleships.socket"), false).unwrap();
    let mut rng = StdRng::seed_from_u64(3);

    let contest = run_contest(
        &endpoint,
        &contest_options(vec![sample_exec("alpha"), sample_exec("beta")]),
        &mut rng,
    )
    .unwrap();

    // the probe filled in the names from the Hello
    for player in &contest.players {
        assert!(player.played);
        assert_eq!(player.ai_name, "Sample AI");
    }

    // two identical AIs tie every match; a tie costs both a life, so three
    // rounds empty both tanks at once (the degenerate simultaneous knockout)
    assert_eq!(contest.rounds.len(), 3);
    for player in &contest.players {
        assert_eq!(player.lives, 0);
        assert_eq!(player.stats.ties, 3);
        assert_eq!(player.stats.wins, 0);
        assert!(player.error.is_none());
    }
    for round in &contest.rounds {
        assert_eq!(round.matches.len(), 1);
        let m = &round.matches[0];
        assert_eq!(m.player1.match_result, GameResult::Tie);
        assert_eq!(m.player2.match_result, GameResult::Tie);
        assert!(m.elapsed_time >= 0.0);
        // last_game is the real final game, with ships on both sides
        assert!(!m.last_game.player1.ships.is_empty());
    }

    // and the whole thing survives the disk
    let dir2 = tempfile::tempdir().unwrap();
    save_contest_log(&contest, dir2.path()).unwrap();
    let back = open_contest_log(dir2.path()).unwrap();
    assert_eq!(back.to_value(), contest.to_value());
}
