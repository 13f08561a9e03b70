//! # Tic-Tac-Toe Client Library
//!
//! A thin terminal client for the tic-tac-toe server. The server is the only
//! authority: the client decodes whatever it is sent, mirrors it in a local
//! view, and forwards the player's choices as `MOVE` and `RESET` commands.
//!
//! ## Module Organization
//!
//! ### Game Module (`game`)
//! [`game::ClientView`], the local mirror of the match: seat, board, turn,
//! result and peer presence, updated only from server messages.
//!
//! ### Input Module (`input`)
//! Turns typed lines into commands (`1`-`9`, `r`, `q`) and provides the
//! random move policy used by `--bot` and `--solo`.
//!
//! ### Network Module (`network`)
//! Owns the TCP connection and the event loop that multiplexes server lines
//! with keyboard input.
//!
//! ### Rendering Module (`rendering`)
//! Prints the board as a text grid with a status line.
//!
//! ### Solo Module (`solo`)
//! A local match against the random policy, driven by the shared turn
//! engine with no server involved.

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
pub mod solo;
