//! Line-oriented text protocol between server and clients
//!
//! Every message travels as one `\n`-terminated line. [`fmt::Display`]
//! produces the wire text without the terminator and [`std::str::FromStr`]
//! parses it back, tolerating surrounding whitespace and a trailing `\r`.
//!
//! Server to client:
//! - `ID:<seat>` seat assignment
//! - `STATE:<c0,...,c8>:<turn>` full board snapshot plus whose turn it is
//! - `RESULT:TIE` / `RESULT:WIN:<seat>` match finished
//! - `RESET` match restarted, a fresh `STATE` follows
//! - `FULL` both seats taken, the connection is about to close
//! - `DISCONNECT:<seat>` the peer left
//!
//! Client to server: `MOVE:<0..8>` and `RESET`.

use crate::{Board, Cell, Outcome, Seat, BOARD_SIZE, EMPTY_CELL};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while decoding a protocol line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("empty message")]
    Empty,
    #[error("unknown message: {0}")]
    Unknown(String),
    #[error("invalid position: {0}")]
    InvalidPosition(String),
    #[error("invalid seat: {0}")]
    InvalidSeat(String),
    #[error("invalid cell: {0}")]
    InvalidCell(String),
    #[error("expected {expected} cells, found {found}")]
    CellCount { expected: usize, found: usize },
    #[error("line longer than {0} bytes")]
    LineTooLong(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    Id(Seat),
    State { board: Board, turn: Seat },
    Result(Outcome),
    Reset,
    Full,
    Disconnect(Seat),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMessage {
    Move { position: usize },
    Reset,
}

impl ServerMessage {
    /// Wire form including the line terminator.
    pub fn to_line(&self) -> String {
        format!("{}\n", self)
    }
}

impl ClientMessage {
    pub fn to_line(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Id(seat) => write!(f, "ID:{}", seat),
            ServerMessage::State { board, turn } => {
                let cells: Vec<String> = board.cells().iter().map(|c| c.to_string()).collect();
                write!(f, "STATE:{}:{}", cells.join(","), turn)
            }
            ServerMessage::Result(Outcome::Tie) => write!(f, "RESULT:TIE"),
            ServerMessage::Result(Outcome::Win(seat)) => write!(f, "RESULT:WIN:{}", seat),
            ServerMessage::Reset => write!(f, "RESET"),
            ServerMessage::Full => write!(f, "FULL"),
            ServerMessage::Disconnect(seat) => write!(f, "DISCONNECT:{}", seat),
        }
    }
}

impl fmt::Display for ClientMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientMessage::Move { position } => write!(f, "MOVE:{}", position),
            ClientMessage::Reset => write!(f, "RESET"),
        }
    }
}

fn parse_seat(text: &str) -> Result<Seat, ProtocolError> {
    text.trim()
        .parse::<usize>()
        .ok()
        .and_then(Seat::from_index)
        .ok_or_else(|| ProtocolError::InvalidSeat(text.to_string()))
}

fn parse_cell(text: &str) -> Result<Cell, ProtocolError> {
    let mut chars = text.trim().chars();
    match (chars.next(), chars.next()) {
        (Some('X'), None) => Ok(Cell::Taken(Seat::First)),
        (Some('O'), None) => Ok(Cell::Taken(Seat::Second)),
        (Some(c), None) if c == EMPTY_CELL => Ok(Cell::Empty),
        _ => Err(ProtocolError::InvalidCell(text.to_string())),
    }
}

fn parse_board(text: &str) -> Result<Board, ProtocolError> {
    let tokens: Vec<&str> = text.split(',').collect();
    if tokens.len() != BOARD_SIZE {
        return Err(ProtocolError::CellCount {
            expected: BOARD_SIZE,
            found: tokens.len(),
        });
    }

    let mut cells = [Cell::Empty; BOARD_SIZE];
    for (cell, token) in cells.iter_mut().zip(tokens) {
        *cell = parse_cell(token)?;
    }
    Ok(Board::from_cells(cells))
}

impl FromStr for ServerMessage {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        match line {
            "" => return Err(ProtocolError::Empty),
            "RESET" => return Ok(ServerMessage::Reset),
            "FULL" => return Ok(ServerMessage::Full),
            _ => {}
        }

        let (tag, rest) = line
            .split_once(':')
            .ok_or_else(|| ProtocolError::Unknown(line.to_string()))?;

        match tag {
            "ID" => Ok(ServerMessage::Id(parse_seat(rest)?)),
            "DISCONNECT" => Ok(ServerMessage::Disconnect(parse_seat(rest)?)),
            "RESULT" => match rest.split_once(':') {
                None if rest == "TIE" => Ok(ServerMessage::Result(Outcome::Tie)),
                Some(("WIN", seat)) => Ok(ServerMessage::Result(Outcome::Win(parse_seat(seat)?))),
                _ => Err(ProtocolError::Unknown(line.to_string())),
            },
            "STATE" => {
                let (cells, turn) = rest
                    .rsplit_once(':')
                    .ok_or_else(|| ProtocolError::Unknown(line.to_string()))?;
                Ok(ServerMessage::State {
                    board: parse_board(cells)?,
                    turn: parse_seat(turn)?,
                })
            }
            _ => Err(ProtocolError::Unknown(line.to_string())),
        }
    }
}

impl FromStr for ClientMessage {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        if line.is_empty() {
            return Err(ProtocolError::Empty);
        }
        if line == "RESET" {
            return Ok(ClientMessage::Reset);
        }

        let position = line
            .strip_prefix("MOVE:")
            .ok_or_else(|| ProtocolError::Unknown(line.to_string()))?;
        position
            .trim()
            .parse::<usize>()
            .map(|position| ClientMessage::Move { position })
            .map_err(|_| ProtocolError::InvalidPosition(position.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_state() {
        let mut board = Board::new();
        board.place(0, Seat::First);
        board.place(4, Seat::Second);

        let msg = ServerMessage::State {
            board,
            turn: Seat::First,
        };
        assert_eq!(msg.to_string(), "STATE:X,_,_,_,O,_,_,_,_:0");
        assert_eq!(msg.to_line(), "STATE:X,_,_,_,O,_,_,_,_:0\n");
    }

    #[test]
    fn test_decode_state_rebuilds_board() {
        let mut board = Board::new();
        for (pos, seat) in [(2, Seat::First), (3, Seat::Second), (8, Seat::First)] {
            board.place(pos, seat);
        }
        let original = ServerMessage::State {
            board,
            turn: Seat::Second,
        };

        let decoded: ServerMessage = original.to_line().parse().unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_encode_control_messages() {
        assert_eq!(ServerMessage::Id(Seat::Second).to_string(), "ID:1");
        assert_eq!(ServerMessage::Result(Outcome::Tie).to_string(), "RESULT:TIE");
        assert_eq!(
            ServerMessage::Result(Outcome::Win(Seat::First)).to_string(),
            "RESULT:WIN:0"
        );
        assert_eq!(ServerMessage::Reset.to_string(), "RESET");
        assert_eq!(ServerMessage::Full.to_string(), "FULL");
        assert_eq!(ServerMessage::Disconnect(Seat::First).to_string(), "DISCONNECT:0");
    }

    #[test]
    fn test_decode_control_messages() {
        assert_eq!("ID:0".parse::<ServerMessage>(), Ok(ServerMessage::Id(Seat::First)));
        assert_eq!("FULL\r\n".parse::<ServerMessage>(), Ok(ServerMessage::Full));
        assert_eq!(
            "RESULT:WIN:1".parse::<ServerMessage>(),
            Ok(ServerMessage::Result(Outcome::Win(Seat::Second)))
        );
        assert_eq!("RESULT:TIE".parse::<ServerMessage>(), Ok(ServerMessage::Result(Outcome::Tie)));
        assert_eq!(
            "DISCONNECT:1".parse::<ServerMessage>(),
            Ok(ServerMessage::Disconnect(Seat::Second))
        );
    }

    #[test]
    fn test_decode_rejects_bad_server_lines() {
        assert_eq!("ID:2".parse::<ServerMessage>(), Err(ProtocolError::InvalidSeat("2".into())));
        assert_eq!(
            "STATE:X,O,_:0".parse::<ServerMessage>(),
            Err(ProtocolError::CellCount {
                expected: BOARD_SIZE,
                found: 3
            })
        );
        assert_eq!(
            "STATE:X,O,_,_,_,_,_,_,Z:0".parse::<ServerMessage>(),
            Err(ProtocolError::InvalidCell("Z".into()))
        );
        assert!("RESULT:LOSS".parse::<ServerMessage>().is_err());
        assert!("HELLO".parse::<ServerMessage>().is_err());
        assert_eq!("   ".parse::<ServerMessage>(), Err(ProtocolError::Empty));
    }

    #[test]
    fn test_decode_client_commands() {
        assert_eq!("MOVE:4\n".parse::<ClientMessage>(), Ok(ClientMessage::Move { position: 4 }));
        assert_eq!("RESET\r\n".parse::<ClientMessage>(), Ok(ClientMessage::Reset));
        assert_eq!(ClientMessage::Move { position: 7 }.to_line(), "MOVE:7\n");
    }

    #[test]
    fn test_decode_bad_client_commands() {
        assert_eq!(
            "MOVE:abc".parse::<ClientMessage>(),
            Err(ProtocolError::InvalidPosition("abc".into()))
        );
        assert_eq!(
            "MOVE:-1".parse::<ClientMessage>(),
            Err(ProtocolError::InvalidPosition("-1".into()))
        );
        assert_eq!(
            "JUMP".parse::<ClientMessage>(),
            Err(ProtocolError::Unknown("JUMP".into()))
        );
        assert_eq!("".parse::<ClientMessage>(), Err(ProtocolError::Empty));
    }

    #[test]
    fn test_out_of_range_move_still_decodes() {
        // Range is the engine's call, not the codec's.
        assert_eq!("MOVE:12".parse::<ClientMessage>(), Ok(ClientMessage::Move { position: 12 }));
    }
}
