use log::debug;
use shared::{Board, Outcome, Seat, ServerMessage};

/// The client's mirror of the server's match, rebuilt purely from
/// server messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientView {
    pub seat: Option<Seat>,
    pub board: Board,
    pub turn: Seat,
    /// A `STATE` has arrived since the last disconnect
    pub in_match: bool,
    pub result: Option<Outcome>,
    pub peer_left: bool,
    pub room_full: bool,
}

impl Default for ClientView {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientView {
    pub fn new() -> Self {
        Self {
            seat: None,
            board: Board::new(),
            turn: Seat::First,
            in_match: false,
            result: None,
            peer_left: false,
            room_full: false,
        }
    }

    pub fn apply_server_message(&mut self, message: &ServerMessage) {
        debug!("Applying {}", message);
        match message {
            ServerMessage::Id(seat) => self.seat = Some(*seat),
            ServerMessage::State { board, turn } => {
                // The final STATE of a match precedes its RESULT, so any
                // STATE means play is open again.
                self.board = *board;
                self.turn = *turn;
                self.in_match = true;
                self.result = None;
                self.peer_left = false;
            }
            ServerMessage::Result(outcome) => self.result = Some(*outcome),
            ServerMessage::Reset => {
                // The server restarts with seat 0 to move.
                self.board = Board::new();
                self.turn = Seat::First;
                self.result = None;
            }
            ServerMessage::Full => self.room_full = true,
            ServerMessage::Disconnect(_) => {
                self.peer_left = true;
                self.in_match = false;
            }
        }
    }

    /// The final `STATE` of a match arrives just before its `RESULT` with the
    /// turn unchanged, so a decided board never counts as our turn.
    pub fn is_my_turn(&self) -> bool {
        self.in_match
            && self.result.is_none()
            && self.board.outcome().is_none()
            && self.seat == Some(self.turn)
    }

    pub fn can_play(&self, position: usize) -> bool {
        self.is_my_turn() && self.board.is_free(position)
    }

    /// Mirrors the server rule: seat 0, finished match, peer still here.
    pub fn can_reset(&self) -> bool {
        self.seat == Some(Seat::First) && self.result.is_some() && self.in_match
    }

    pub fn status(&self) -> String {
        let Some(seat) = self.seat else {
            return if self.room_full {
                "Room is full".to_string()
            } else {
                "Connecting...".to_string()
            };
        };

        if self.peer_left {
            return "Opponent disconnected, waiting for a new player".to_string();
        }
        if !self.in_match {
            return format!("You are {}. Waiting for an opponent", seat.symbol());
        }

        match self.result {
            Some(Outcome::Tie) => "Draw!".to_string(),
            Some(Outcome::Win(winner)) if winner == seat => "You win!".to_string(),
            Some(Outcome::Win(winner)) => format!("{} wins", winner.symbol()),
            None if self.is_my_turn() => format!("Your turn ({})", seat.symbol()),
            None => format!("Waiting for {}", self.turn.symbol()),
        }
    }
}
