//! One game of Battleships, from `StartGame` to `GameOver`.
//!
//! The engine drives both peers in lockstep: every message is sent to (or
//! received from) player 1 first, then player 2, and the outcome of a step
//! is judged only after both sides have gone through it. A fault at any
//! step ends the game immediately with the result decided by which side
//! faulted; the surviving side is never asked another question.

use rand::rngs::StdRng;
use rand::Rng;
use tracing::{instrument, trace};

use crate::board::Board;
use crate::logs::{GameLog, GameStats};
use crate::protocol;
use crate::rules;
use crate::transport::Peer;
use crate::types::{BoardValue, FaultStatus, GameResult, PlayerNum, Ship, Shot};

/// How many ships a game uses and the length range they are drawn from.
/// Fixed per board size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipSchedule {
    pub num_ships: usize,
    pub max_len: i32,
    pub min_len: i32,
}

/// The ship schedule for a board size, `None` outside 3..=10.
pub fn ship_schedule(board_size: usize) -> Option<ShipSchedule> {
    let (num_ships, max_len, min_len) = match board_size {
        10 => (6, 5, 3),
        9 => (5, 5, 3),
        8 => (5, 4, 3),
        7 => (5, 4, 2),
        6 => (5, 3, 2),
        5 => (4, 3, 2),
        4 => (4, 3, 1),
        3 => (3, 2, 1),
        _ => return None,
    };
    Some(ShipSchedule {
        num_ships,
        max_len,
        min_len,
    })
}

impl ShipSchedule {
    /// Draw one ship length: the maximum 1 time in 6, the midpoint 2 in 6,
    /// the minimum otherwise.
    pub fn draw_len(&self, rng: &mut StdRng) -> i32 {
        match rng.random_range(0..6) {
            5 => self.max_len,
            4 | 3 => (self.max_len + self.min_len) / 2,
            _ => self.min_len,
        }
    }
}

/// Play one full game on a cleared board and return its log.
#[instrument(skip_all)]
pub fn run_game(
    p1: &mut Peer,
    p2: &mut Peer,
    board: &mut Board,
    schedule: &ShipSchedule,
    rng: &mut StdRng,
) -> GameLog {
    let mut game = GameLog::default();
    board.clear();

    if !send_both(&mut game, p1, p2, &protocol::start_game_msg()).is_clear() {
        return game;
    }

    if !place_ships(&mut game, p1, p2, board, schedule, rng).is_clear() {
        return game;
    }

    if !send_both(&mut game, p1, p2, &protocol::take_shot_msg()).is_clear() {
        return game;
    }

    // gives every AI the chance to shoot at every cell once, which is enough
    let max_rounds = board.size() * board.size();
    let mut next_shot = true;
    for round in 0..max_rounds {
        if round == max_rounds - 1 {
            next_shot = false;
        }
        if !shot_round(&mut game, p1, p2, board, &mut next_shot).is_clear() {
            return game;
        }
        if !next_shot {
            break;
        }
    }

    calculate_winner(&mut game);
    send_game_over(&mut game, p1, p2);
    trace!(
        result1 = ?game.player1.stats.result,
        result2 = ?game.player2.stats.result,
        "game finished"
    );
    game
}

/// Record both peers' step outcomes, and on any fault write the game result
/// the fault attribution rule dictates.
fn apply_faults(game: &mut GameLog) -> FaultStatus {
    let status = FaultStatus::of(&game.player1.error, &game.player2.error);
    match status {
        FaultStatus::Both => {
            game.player1.stats.result = GameResult::Tie;
            game.player2.stats.result = GameResult::Tie;
        }
        FaultStatus::PlayerOne => {
            game.player1.stats.result = GameResult::Loss;
            game.player2.stats.result = GameResult::Win;
        }
        FaultStatus::PlayerTwo => {
            game.player1.stats.result = GameResult::Win;
            game.player2.stats.result = GameResult::Loss;
        }
        FaultStatus::Clear => {}
    }
    status
}

fn send_both(game: &mut GameLog, p1: &mut Peer, p2: &mut Peer, text: &str) -> FaultStatus {
    game.player1.error = p1.send(text).err();
    game.player2.error = p2.send(text).err();
    apply_faults(game)
}

fn place_ships(
    game: &mut GameLog,
    p1: &mut Peer,
    p2: &mut Peer,
    board: &mut Board,
    schedule: &ShipSchedule,
    rng: &mut StdRng,
) -> FaultStatus {
    for _ in 0..schedule.num_ships {
        let length = schedule.draw_len(rng);
        let status = place_one_ship(game, p1, p2, board, length);
        if !status.is_clear() {
            return status;
        }
    }
    FaultStatus::Clear
}

fn place_one_ship(
    game: &mut GameLog,
    p1: &mut Peer,
    p2: &mut Peer,
    board: &mut Board,
    length: i32,
) -> FaultStatus {
    let status = send_both(game, p1, p2, &protocol::place_ship_msg(length));
    if !status.is_clear() {
        return status;
    }

    let recv1 = p1.recv();
    let recv2 = p2.recv();
    game.player1.error = recv1.as_ref().err().cloned();
    game.player2.error = recv2.as_ref().err().cloned();
    let status = apply_faults(game);
    let (Ok(text1), Ok(text2)) = (recv1, recv2) else {
        return status;
    };

    let parsed1 = protocol::parse_ship_placed_msg(&text1);
    let parsed2 = protocol::parse_ship_placed_msg(&text2);
    game.player1.error = parsed1.as_ref().err().cloned();
    game.player2.error = parsed2.as_ref().err().cloned();
    let status = apply_faults(game);
    let (Ok(mut ship1), Ok(mut ship2)) = (parsed1, parsed2) else {
        return status;
    };

    game.player1.error = rules::validate_ship(board, PlayerNum::One, ship1, length).err();
    game.player2.error = rules::validate_ship(board, PlayerNum::Two, ship2, length).err();
    let status = apply_faults(game);
    if !status.is_clear() {
        return status;
    }

    board.store_ship(PlayerNum::One, &ship1, BoardValue::Ship);
    board.store_ship(PlayerNum::Two, &ship2, BoardValue::Ship);
    ship1.alive = true;
    ship2.alive = true;
    game.player1.ships.push(ship1);
    game.player2.ships.push(ship2);

    FaultStatus::Clear
}

fn shot_round(
    game: &mut GameLog,
    p1: &mut Peer,
    p2: &mut Peer,
    board: &mut Board,
    next_shot: &mut bool,
) -> FaultStatus {
    let recv1 = p1.recv();
    let recv2 = p2.recv();
    game.player1.error = recv1.as_ref().err().cloned();
    game.player2.error = recv2.as_ref().err().cloned();
    let status = apply_faults(game);
    let (Ok(text1), Ok(text2)) = (recv1, recv2) else {
        return status;
    };

    let parsed1 = protocol::parse_shot_taken_msg(&text1);
    let parsed2 = protocol::parse_shot_taken_msg(&text2);
    game.player1.error = parsed1.as_ref().err().cloned();
    game.player2.error = parsed2.as_ref().err().cloned();
    let status = apply_faults(game);
    let (Ok(mut shot1), Ok(mut shot2)) = (parsed1, parsed2) else {
        return status;
    };

    game.player1.error = rules::validate_shot(board.size(), shot1).err();
    game.player2.error = rules::validate_shot(board.size(), shot2).err();
    let status = apply_faults(game);
    if !status.is_clear() {
        return status;
    }

    // each shot lands on the opponent's grid
    calculate_shot_value(&mut game.player1.stats, &mut shot1, PlayerNum::Two, board);
    calculate_shot_value(&mut game.player2.stats, &mut shot2, PlayerNum::One, board);

    shot1.ship_sunk_idx = find_dead_ship(&mut game.player2.ships, PlayerNum::Two, board);
    shot2.ship_sunk_idx = find_dead_ship(&mut game.player1.ships, PlayerNum::One, board);
    if shot1.ship_sunk_idx != -1 {
        game.player1.stats.ships_killed += 1;
    }
    if shot2.ship_sunk_idx != -1 {
        game.player2.stats.ships_killed += 1;
    }

    if count_alive_ships(&game.player1.ships) == 0 || count_alive_ships(&game.player2.ships) == 0 {
        *next_shot = false;
    }

    let msg = protocol::shot_return_msg(
        &shot1,
        &shot2,
        &game.player1.ships,
        &game.player2.ships,
        *next_shot,
    );

    game.player1.shots.push(shot1);
    game.player2.shots.push(shot2);

    send_both(game, p1, p2, &msg)
}

/// Derive a shot's value from the prior cell state, bump the right counter,
/// and write the new value back to the cell.
fn calculate_shot_value(
    stats: &mut GameStats,
    shot: &mut Shot,
    opponent: PlayerNum,
    board: &mut Board,
) {
    let prior = board.value_at(opponent, shot.row, shot.col);
    shot.value = match prior {
        BoardValue::Ship => {
            stats.hits += 1;
            stats.num_board_shot += 1;
            BoardValue::Hit
        }
        BoardValue::Water => {
            stats.misses += 1;
            stats.num_board_shot += 1;
            BoardValue::Miss
        }
        BoardValue::Hit | BoardValue::DuplicateHit => {
            stats.duplicates += 1;
            BoardValue::DuplicateHit
        }
        BoardValue::Miss | BoardValue::DuplicateMiss => {
            stats.duplicates += 1;
            BoardValue::DuplicateMiss
        }
        BoardValue::Kill | BoardValue::DuplicateKill => {
            stats.duplicates += 1;
            BoardValue::DuplicateKill
        }
    };
    board.store_shot(opponent, shot);
}

/// Find the first still-alive ship of `owner` whose every cell has been hit,
/// mark it dead, and paint its cells KILL. At most one ship sinks per shot.
/// Returns the ship's index, or -1.
fn find_dead_ship(ships: &mut [Ship], owner: PlayerNum, board: &mut Board) -> i32 {
    for (idx, ship) in ships.iter_mut().enumerate() {
        if !ship.alive {
            continue;
        }
        if board.ship_died(owner, ship) {
            ship.alive = false;
            board.store_ship(owner, ship, BoardValue::Kill);
            return idx as i32;
        }
    }
    -1
}

fn count_alive_ships(ships: &[Ship]) -> i32 {
    ships.iter().filter(|s| s.alive).count() as i32
}

/// More surviving ships wins; none on either side is a tie, and equal
/// nonzero counts (the shot rounds ran out) tie as well.
fn calculate_winner(game: &mut GameLog) {
    let alive1 = count_alive_ships(&game.player1.ships);
    let alive2 = count_alive_ships(&game.player2.ships);

    let (result1, result2) = match alive1.cmp(&alive2) {
        std::cmp::Ordering::Greater => (GameResult::Win, GameResult::Loss),
        std::cmp::Ordering::Less => (GameResult::Loss, GameResult::Win),
        std::cmp::Ordering::Equal => (GameResult::Tie, GameResult::Tie),
    };
    game.player1.stats.result = result1;
    game.player2.stats.result = result2;
}

fn send_game_over(game: &mut GameLog, p1: &mut Peer, p2: &mut Peer) -> FaultStatus {
    let msg1 = protocol::game_over_msg(&game.player1.stats);
    let msg2 = protocol::game_over_msg(&game.player2.stats);
    game.player1.error = p1.send(&msg1).err();
    game.player2.error = p2.send(&msg2).err();
    apply_faults(game)
}
