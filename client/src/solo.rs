//! Local play against the move policy, with no server.
//!
//! The player is always `X` and moves first; the policy answers as `O`
//! straight after every move that leaves the match open. Moves go through
//! the same turn engine the server uses.

use crate::input::{parse_command, Command, RandomPolicy};
use crate::rendering::render_board;
use log::debug;
use shared::game::{MatchState, MoveError};
use shared::{Outcome, Seat};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

pub struct SoloGame {
    state: MatchState,
    policy: RandomPolicy,
    player: Seat,
}

impl SoloGame {
    pub fn new(policy: RandomPolicy) -> Self {
        Self {
            state: MatchState::started(),
            policy,
            player: Seat::First,
        }
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.state.board.outcome()
    }

    /// Plays the player's move, then the policy's reply if the match is
    /// still open. Returns the outcome once the match is decided.
    pub fn play(&mut self, position: usize) -> Result<Option<Outcome>, MoveError> {
        let (next, outcome) = self.state.apply(self.player, position)?;
        self.state = next;
        if outcome.is_some() {
            return Ok(outcome);
        }
        self.reply()
    }

    fn reply(&mut self) -> Result<Option<Outcome>, MoveError> {
        let seat = self.player.other();
        let position = self
            .policy
            .choose(&self.state.board)
            .ok_or(MoveError::IllegalMove)?;
        debug!("Policy plays {}", position);

        let (next, outcome) = self.state.apply(seat, position)?;
        self.state = next;
        Ok(outcome)
    }

    pub fn restart(&mut self) {
        self.state = MatchState::started();
    }

    pub fn status(&self) -> String {
        match self.outcome() {
            None => format!("Your turn ({})", self.player.symbol()),
            Some(Outcome::Tie) => "Draw!".to_string(),
            Some(Outcome::Win(winner)) if winner == self.player => "You win!".to_string(),
            Some(Outcome::Win(winner)) => format!("{} wins", winner.symbol()),
        }
    }

    fn render(&self) {
        println!();
        println!("{}", render_board(&self.state.board));
        println!();
        println!("{}", self.status());
        if self.outcome().is_some() {
            println!("Press r then Enter to play again");
        }
    }

    /// Reads commands until `q` or end of input.
    pub async fn run<R: AsyncBufRead + Unpin>(&mut self, input: R) -> std::io::Result<()> {
        let mut lines = input.lines();
        self.render();

        while let Some(line) = lines.next_line().await? {
            match parse_command(&line) {
                Some(Command::Play(position)) => match self.play(position) {
                    Ok(_) => self.render(),
                    Err(e) => println!("Cannot play cell {}: {}", position + 1, e),
                },
                Some(Command::Reset) if self.outcome().is_some() => {
                    self.restart();
                    self.render();
                }
                Some(Command::Reset) => println!("Finish the match before restarting"),
                Some(Command::Quit) => break,
                None => println!("Type 1-9 to play, r to restart, q to quit"),
            }
        }

        Ok(())
    }
}
