//! # Tic-Tac-Toe Server Library
//!
//! The authoritative server for a two-seat tic-tac-toe room. It owns the
//! canonical match, validates every move, and pushes the resulting state to
//! both players over plain TCP.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative State
//! Clients never decide anything. They send `MOVE` and `RESET` commands and
//! render whatever `STATE` and `RESULT` lines come back.
//!
//! ### Seat Management
//! Exactly two seats exist. The first free seat goes to each new connection,
//! a third connection receives `FULL` and is closed, and a dropped connection
//! frees its seat and notifies the peer.
//!
//! ### Consistent Broadcasts
//! Every mutation runs under one lock and queues its messages before the lock
//! is released, so both players see the same sequence of states.
//!
//! ## Module Organization
//!
//! The turn engine itself ([`shared::game::MatchState`]) lives in the shared
//! crate; the registry is its only caller on the server.
//!
//! ### Registry Module (`registry`)
//! The seat slots plus the match, behind a single `tokio::sync::Mutex`:
//! - Seating and the opening broadcast once both seats are filled
//! - Command routing and stale-connection filtering
//! - Reset rules and disconnect cleanup
//!
//! ### Network Module (`network`)
//! The TCP accept loop and the two tasks spawned per connection:
//! - Reader: decodes newline-delimited commands and drives the registry
//! - Writer: drains the seat's outbound queue onto the socket
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = Server::bind("0.0.0.0:5555").await?;
//!     server.run().await;
//!     Ok(())
//! }
//! ```

pub mod network;
pub mod registry;
