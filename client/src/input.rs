//! Keyboard commands and the automatic move policy

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use shared::Board;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Board index, already converted from the 1-9 keys
    Play(usize),
    Reset,
    Quit,
}

/// Parses one line typed by the player: `1`-`9` picks a cell in reading
/// order, `r` resets, `q` quits.
pub fn parse_command(line: &str) -> Option<Command> {
    match line.trim().to_ascii_lowercase().as_str() {
        "r" | "reset" => Some(Command::Reset),
        "q" | "quit" => Some(Command::Quit),
        other => match other.parse::<usize>() {
            Ok(n @ 1..=9) => Some(Command::Play(n - 1)),
            _ => None,
        },
    }
}

/// Picks uniformly among the free cells. Stands in for any opponent policy.
pub struct RandomPolicy {
    rng: StdRng,
}

impl RandomPolicy {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn choose(&mut self, board: &Board) -> Option<usize> {
        board.free_positions().choose(&mut self.rng).copied()
    }
}

impl Default for RandomPolicy {
    fn default() -> Self {
        Self::new()
    }
}
