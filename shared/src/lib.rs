//! Board model and wire protocol shared by the tic-tac-toe server and client.
//!
//! The server owns the authoritative [`Board`]; clients rebuild their copy
//! from `STATE` lines decoded through [`protocol`]. The turn engine in
//! [`game`] is shared so local games follow the same rules.

use std::fmt;

pub mod game;
pub mod protocol;

pub use protocol::{ClientMessage, ProtocolError, ServerMessage};

pub const BOARD_SIZE: usize = 9;
pub const BOARD_WIDTH: usize = 3;
pub const DEFAULT_PORT: u16 = 5555;

/// Wire token for an empty cell.
pub const EMPTY_CELL: char = '_';

/// Every three-in-a-row: rows, columns, then diagonals.
pub const WINNING_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// One of the two fixed player slots.
///
/// Seat 0 always plays `X` and moves first; seat 1 plays `O`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Seat {
    First,
    Second,
}

impl Seat {
    pub const ALL: [Seat; 2] = [Seat::First, Seat::Second];

    pub fn index(self) -> usize {
        match self {
            Seat::First => 0,
            Seat::Second => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Seat> {
        match index {
            0 => Some(Seat::First),
            1 => Some(Seat::Second),
            _ => None,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Seat::First => 'X',
            Seat::Second => 'O',
        }
    }

    pub fn other(self) -> Seat {
        match self {
            Seat::First => Seat::Second,
            Seat::Second => Seat::First,
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cell {
    #[default]
    Empty,
    Taken(Seat),
}

impl Cell {
    pub fn symbol(self) -> char {
        match self {
            Cell::Empty => EMPTY_CELL,
            Cell::Taken(seat) => seat.symbol(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Terminal result of a match. An ongoing match has no outcome, so callers
/// work with `Option<Outcome>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Tie,
    Win(Seat),
}

/// The 3x3 grid, stored row-major: index `i` is row `i / 3`, column `i % 3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Board {
    cells: [Cell; BOARD_SIZE],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: [Cell; BOARD_SIZE]) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Cell; BOARD_SIZE] {
        &self.cells
    }

    pub fn get(&self, position: usize) -> Option<Cell> {
        self.cells.get(position).copied()
    }

    /// Returns true if `position` is on the board and nobody has played there.
    pub fn is_free(&self, position: usize) -> bool {
        self.get(position) == Some(Cell::Empty)
    }

    /// Marks `position` for `seat`.
    ///
    /// Occupied or off-board positions are left untouched and return false;
    /// a taken cell is never overwritten.
    pub fn place(&mut self, position: usize, seat: Seat) -> bool {
        if !self.is_free(position) {
            return false;
        }
        self.cells[position] = Cell::Taken(seat);
        true
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| *cell != Cell::Empty)
    }

    pub fn free_positions(&self) -> Vec<usize> {
        (0..BOARD_SIZE).filter(|&pos| self.is_free(pos)).collect()
    }

    /// Finds a seat holding all three cells of any winning line.
    pub fn winner(&self) -> Option<Seat> {
        WINNING_LINES.iter().find_map(|[a, b, c]| {
            match (self.cells[*a], self.cells[*b], self.cells[*c]) {
                (Cell::Taken(x), Cell::Taken(y), Cell::Taken(z)) if x == y && y == z => Some(x),
                _ => None,
            }
        })
    }

    /// Derives the match outcome from the current cells.
    ///
    /// A completed line wins even on a full board; a full board without one
    /// is a tie; anything else is still in play.
    pub fn outcome(&self) -> Option<Outcome> {
        if let Some(seat) = self.winner() {
            Some(Outcome::Win(seat))
        } else if self.is_full() {
            Some(Outcome::Tie)
        } else {
            None
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, cells) in self.cells.chunks(BOARD_WIDTH).enumerate() {
            if row > 0 {
                writeln!(f)?;
            }
            let line: Vec<String> = cells.iter().map(|cell| cell.to_string()).collect();
            write!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}
