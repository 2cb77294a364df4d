//! Legality checks for ships and shots.
//!
//! These never mutate the board; the game engine applies state changes only
//! after both players' messages pass. A failed check is attributed to the
//! peer that sent the message.

use crate::board::Board;
use crate::types::{BoardValue, Direction, PeerFault, PlayerNum, Ship, Shot};

/// Check a placed ship against the expected length, the board edge, and the
/// player's own ships already on the grid.
pub fn validate_ship(
    board: &Board,
    player: PlayerNum,
    ship: Ship,
    expected_len: i32,
) -> Result<(), PeerFault> {
    if ship.len != expected_len {
        return Err(PeerFault::ShipLength(ship));
    }

    let size = board.size() as i32;
    // along-axis extent, plus the fixed coordinate on the other axis
    let (front, check) = match ship.dir {
        Direction::Horizontal => (ship.col, ship.row),
        Direction::Vertical => (ship.row, ship.col),
    };
    let end = front + (ship.len - 1);
    if front < 0 || end >= size || check < 0 || check >= size {
        return Err(PeerFault::ShipOffBoard(ship));
    }

    for (row, col) in ship.cells() {
        if board.value_at(player, row, col) != BoardValue::Water {
            return Err(PeerFault::ShipIntersect(ship));
        }
    }

    Ok(())
}

/// Check a shot lies on the board. Duplicate shots are legal; their outcome
/// is encoded in the returned board value instead.
pub fn validate_shot(size: usize, shot: Shot) -> Result<(), PeerFault> {
    let size = size as i32;
    if shot.row < 0 || shot.row >= size || shot.col < 0 || shot.col >= size {
        return Err(PeerFault::ShotOffBoard(shot));
    }
    Ok(())
}
