//! Match state and the turn engine that advances it.
//!
//! The server runs it as the authority for networked play; the client runs
//! the same rules for local games against a policy.

use crate::{Board, Outcome, Seat};
use log::debug;
use thiserror::Error;

/// Reasons the engine refuses a move. None of them change the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("match is not active")]
    NotActive,
    #[error("not this seat's turn")]
    NotYourTurn,
    #[error("illegal move")]
    IllegalMove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchState {
    pub board: Board,
    pub turn: Seat,
    pub active: bool,
}

impl Default for MatchState {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchState {
    /// Empty board, seat 0 to move, waiting for players.
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            turn: Seat::First,
            active: false,
        }
    }

    /// Empty board with seat 0 to move and play open.
    pub fn started() -> Self {
        Self {
            active: true,
            ..Self::new()
        }
    }

    /// Validates and applies `seat` playing at `position`.
    ///
    /// Checks run in order: the match must be active, it must be `seat`'s
    /// turn, then the position must be an empty cell on the board. On success
    /// returns the next state and its outcome. A terminal outcome deactivates
    /// the match and leaves the turn with the seat that just moved; otherwise
    /// the turn passes to the other seat.
    pub fn apply(&self, seat: Seat, position: usize) -> Result<(MatchState, Option<Outcome>), MoveError> {
        if !self.active {
            return Err(MoveError::NotActive);
        }
        if seat != self.turn {
            return Err(MoveError::NotYourTurn);
        }

        let mut next = *self;
        if !next.board.place(position, seat) {
            return Err(MoveError::IllegalMove);
        }

        let outcome = next.board.outcome();
        match outcome {
            Some(result) => {
                debug!("Seat {} played {} and ended the match: {:?}", seat, position, result);
                next.active = false;
            }
            None => next.turn = seat.other(),
        }

        Ok((next, outcome))
    }
}
