//! Property tests for the wire and log codecs: decoding what we encode is
//! the identity, for every value the domain can produce.

use proptest::prelude::*;
use serde_json::json;

use battleships_controller::logs::{
    GameLog, GamePlayer, GameStats, MatchLog, MatchPlayer, MatchStats,
};
use battleships_controller::protocol::{parse_hello_msg, parse_ship_placed_msg, parse_shot_taken_msg};
use battleships_controller::types::{
    BoardValue, Direction, GameResult, PeerFault, Ship, Shot,
};

fn direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Horizontal), Just(Direction::Vertical)]
}

fn board_value() -> impl Strategy<Value = BoardValue> {
    prop_oneof![
        Just(BoardValue::Water),
        Just(BoardValue::Ship),
        Just(BoardValue::Hit),
        Just(BoardValue::Miss),
        Just(BoardValue::Kill),
        Just(BoardValue::DuplicateHit),
        Just(BoardValue::DuplicateMiss),
        Just(BoardValue::DuplicateKill),
    ]
}

fn game_result() -> impl Strategy<Value = GameResult> {
    prop_oneof![
        Just(GameResult::Win),
        Just(GameResult::Loss),
        Just(GameResult::Tie)
    ]
}

fn any_ship() -> impl Strategy<Value = Ship> {
    (0..10i32, 0..10i32, 1..=5i32, direction()).prop_map(|(row, col, len, dir)| Ship {
        row,
        col,
        len,
        dir,
        alive: false,
    })
}

fn any_shot() -> impl Strategy<Value = Shot> {
    (0..10i32, 0..10i32, board_value(), prop_oneof![Just(-1), 0..6i32]).prop_map(
        |(row, col, value, ship_sunk_idx)| Shot {
            row,
            col,
            value,
            ship_sunk_idx,
        },
    )
}

fn game_stats() -> impl Strategy<Value = GameStats> {
    (0..100i32, 0..100i32, 0..100i32, 0..10i32, game_result()).prop_map(
        |(hits, misses, duplicates, ships_killed, result)| GameStats {
            num_board_shot: hits + misses,
            hits,
            misses,
            duplicates,
            ships_killed,
            result,
        },
    )
}

fn game_player() -> impl Strategy<Value = GamePlayer> {
    (
        prop::collection::vec(any_ship(), 0..6),
        prop::collection::vec(any_shot(), 0..12),
        game_stats(),
    )
        .prop_map(|(ships, shots, stats)| GamePlayer {
            ships,
            shots,
            stats,
            error: None,
        })
}

fn fault() -> impl Strategy<Value = Option<PeerFault>> {
    prop_oneof![
        Just(None),
        Just(Some(PeerFault::Fork)),
        Just(Some(PeerFault::Receive)),
        ".*".prop_map(|m| Some(PeerFault::HelloMessage(m))),
        any_ship().prop_map(|s| Some(PeerFault::ShipOffBoard(s))),
        any_shot().prop_map(|s| Some(PeerFault::ShotOffBoard(s))),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn ship_placed_decode_inverts_encode(ship in any_ship()) {
        let text = json!({
            "mt": 5, "r": ship.row, "c": ship.col, "l": ship.len, "d": ship.dir.code(),
        })
        .to_string();
        let back = parse_ship_placed_msg(&text).unwrap();
        prop_assert_eq!((back.row, back.col, back.len, back.dir), (ship.row, ship.col, ship.len, ship.dir));
    }

    #[test]
    fn shot_taken_decode_inverts_encode(row in 0..10i32, col in 0..10i32) {
        let text = json!({ "mt": 7, "r": row, "c": col }).to_string();
        let back = parse_shot_taken_msg(&text).unwrap();
        prop_assert_eq!((back.row, back.col), (row, col));
    }

    #[test]
    fn hello_decode_accepts_any_names(ai in "[a-zA-Z0-9 ]{0,80}", au in "[a-zA-Z0-9 ]{0,80}") {
        let text = json!({ "mt": 1, "ai": ai.clone(), "au": au.clone() }).to_string();
        let hello = parse_hello_msg(&text).unwrap();
        prop_assert!(ai.starts_with(&hello.ai_name));
        prop_assert!(hello.ai_name.len() <= 64);
        prop_assert!(au.starts_with(&hello.author_name));
    }

    #[test]
    fn game_log_roundtrip(p1 in game_player(), p2 in game_player()) {
        let game = GameLog { player1: p1, player2: p2 };
        let value = game.to_value();
        let back = GameLog::from_value(&value).unwrap();
        prop_assert_eq!(back.to_value(), value);
    }

    #[test]
    fn match_log_roundtrip(
        games in prop::collection::vec((game_player(), game_player()), 0..4),
        error1 in fault(),
        error2 in fault(),
        elapsed_ms in 0u32..1_000_000,
    ) {
        let log = MatchLog {
            board_size: 10,
            elapsed_time: f64::from(elapsed_ms) / 1000.0,
            player1: MatchPlayer {
                ai_name: "one".into(),
                author_name: "a".into(),
                stats: MatchStats::default(),
                error: error1,
            },
            player2: MatchPlayer {
                ai_name: "two".into(),
                author_name: "b".into(),
                stats: MatchStats::default(),
                error: error2,
            },
            games: games
                .into_iter()
                .map(|(player1, player2)| GameLog { player1, player2 })
                .collect(),
        };
        let value = log.to_value();
        let back = MatchLog::from_value(&value).unwrap();
        prop_assert_eq!(back.to_value(), value);
    }
}
