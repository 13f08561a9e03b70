//! Seat bookkeeping and the single point of mutation for the shared match
//!
//! The registry owns both seat slots and the [`MatchState`]. It is shared as
//! [`SharedRegistry`] and every mutation (seating, moves, resets, disconnect
//! cleanup) happens while holding that one lock, so all seats observe state
//! transitions in the same order.
//!
//! The registry never touches sockets. Each seat owns an [`Outbox`] drained
//! by that connection's writer task; broadcasting only queues messages, which
//! keeps the critical section free of network I/O.

use log::{debug, info, warn};
use shared::game::{MatchState, MoveError};
use shared::{ClientMessage, Outcome, Seat, ServerMessage};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};

pub type ConnectionId = u32;
pub type Outbox = mpsc::UnboundedSender<ServerMessage>;
pub type SharedRegistry = Arc<Mutex<Registry>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("both seats are occupied")]
    SeatUnavailable,
    #[error("connection {connection} no longer holds seat {seat}")]
    StaleConnection { connection: ConnectionId, seat: Seat },
    #[error("reset refused for seat {0}")]
    ResetRefused(Seat),
    #[error(transparent)]
    Move(#[from] MoveError),
}

/// A live connection bound to a seat
#[derive(Debug)]
pub struct SeatSlot {
    /// Id issued when this connection was seated
    pub connection: ConnectionId,
    pub addr: SocketAddr,
    outbox: Outbox,
}

impl SeatSlot {
    fn deliver(&self, seat: Seat, message: &ServerMessage) {
        if self.outbox.send(message.clone()).is_err() {
            warn!(
                "Failed to queue {} for seat {} (connection {})",
                message, seat, self.connection
            );
        }
    }
}

/// Owns both seats and the authoritative match
#[derive(Debug)]
pub struct Registry {
    seats: [Option<SeatSlot>; 2],
    state: MatchState,
    next_connection_id: ConnectionId,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            seats: [None, None],
            state: MatchState::new(),
            next_connection_id: 1,
        }
    }

    pub fn shared() -> SharedRegistry {
        Arc::new(Mutex::new(Self::new()))
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn slot(&self, seat: Seat) -> Option<&SeatSlot> {
        self.seats[seat.index()].as_ref()
    }

    pub fn occupied(&self) -> usize {
        self.seats.iter().flatten().count()
    }

    pub fn is_full(&self) -> bool {
        self.occupied() == self.seats.len()
    }

    fn holds(&self, connection: ConnectionId, seat: Seat) -> bool {
        self.slot(seat).map(|slot| slot.connection) == Some(connection)
    }

    /// Claims the first free seat for a new connection.
    ///
    /// Queues `ID:<seat>` to the newcomer. Filling the second seat starts a
    /// fresh match and queues the opening `STATE` to both seats, so neither
    /// client has to speak first. Fails with `SeatUnavailable` without
    /// touching any state when both seats are taken.
    pub fn seat_connection(
        &mut self,
        addr: SocketAddr,
        outbox: Outbox,
    ) -> Result<(ConnectionId, Seat), RegistryError> {
        let seat = Seat::ALL
            .into_iter()
            .find(|seat| self.seats[seat.index()].is_none())
            .ok_or(RegistryError::SeatUnavailable)?;

        let connection = self.next_connection_id;
        self.next_connection_id += 1;

        let slot = SeatSlot {
            connection,
            addr,
            outbox,
        };
        slot.deliver(seat, &ServerMessage::Id(seat));
        self.seats[seat.index()] = Some(slot);
        info!("Connection {} from {} took seat {}", connection, addr, seat);

        if self.is_full() {
            info!("Both seats filled, starting match");
            self.state = MatchState::started();
            self.broadcast_state();
        }

        Ok((connection, seat))
    }

    /// Routes a decoded client command from `connection` sitting in `seat`.
    ///
    /// Commands from a connection that no longer owns the seat are refused.
    pub fn handle_command(
        &mut self,
        connection: ConnectionId,
        seat: Seat,
        command: ClientMessage,
    ) -> Result<(), RegistryError> {
        if !self.holds(connection, seat) {
            return Err(RegistryError::StaleConnection { connection, seat });
        }

        match command {
            ClientMessage::Move { position } => self.apply_move(seat, position).map(|_| ()),
            ClientMessage::Reset => self.reset(seat),
        }
    }

    /// Runs the turn engine and broadcasts the new state, then the result if
    /// the move ended the match. Rejected moves leave everything untouched.
    pub fn apply_move(&mut self, seat: Seat, position: usize) -> Result<Option<Outcome>, RegistryError> {
        let (next, outcome) = self.state.apply(seat, position)?;
        self.state = next;
        self.broadcast_state();

        if let Some(outcome) = outcome {
            info!("Match finished: {:?}", outcome);
            self.broadcast(&ServerMessage::Result(outcome));
        }
        Ok(outcome)
    }

    /// Restarts a finished match.
    ///
    /// Only seat 0 may reset, only while no match is in play, and only with
    /// both seats occupied. Queues `RESET` followed by the fresh `STATE`.
    pub fn reset(&mut self, seat: Seat) -> Result<(), RegistryError> {
        if seat != Seat::First || self.state.active || !self.is_full() {
            return Err(RegistryError::ResetRefused(seat));
        }

        info!("Seat {} reset the match", seat);
        self.state = MatchState::started();
        self.broadcast(&ServerMessage::Reset);
        self.broadcast_state();
        Ok(())
    }

    /// Frees `seat` if `connection` still owns it.
    ///
    /// Ends any match in play and tells the remaining seat with
    /// `DISCONNECT:<seat>`. Dropping the slot closes its outbox, which lets
    /// the connection's writer task finish.
    pub fn release_seat(&mut self, connection: ConnectionId, seat: Seat) -> bool {
        if !self.holds(connection, seat) {
            return false;
        }

        if let Some(slot) = self.seats[seat.index()].take() {
            info!("Connection {} from {} left seat {}", slot.connection, slot.addr, seat);
        }
        self.state.active = false;
        self.broadcast(&ServerMessage::Disconnect(seat));
        true
    }

    /// Queues `message` to every occupied seat. A closed outbox is logged and
    /// does not stop delivery to the other seat.
    pub fn broadcast(&self, message: &ServerMessage) {
        for seat in Seat::ALL {
            if let Some(slot) = self.slot(seat) {
                slot.deliver(seat, message);
            }
        }
    }

    fn broadcast_state(&self) {
        debug!("Broadcasting board:\n{}", self.state.board);
        self.broadcast(&ServerMessage::State {
            board: self.state.board,
            turn: self.state.turn,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{Board, Cell};
    use tokio::sync::mpsc::UnboundedReceiver;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:8081".parse().unwrap()
    }

    fn drain(rx: &mut UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(message) = rx.try_recv() {
            messages.push(message);
        }
        messages
    }

    struct Room {
        registry: Registry,
        first: (ConnectionId, UnboundedReceiver<ServerMessage>),
        second: (ConnectionId, UnboundedReceiver<ServerMessage>),
    }

    fn full_room() -> Room {
        let mut registry = Registry::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        let (id1, _) = registry.seat_connection(test_addr(), tx1).unwrap();
        let (id2, _) = registry.seat_connection(test_addr2(), tx2).unwrap();
        drain(&mut rx1);
        drain(&mut rx2);

        Room {
            registry,
            first: (id1, rx1),
            second: (id2, rx2),
        }
    }

    fn opening_state() -> ServerMessage {
        ServerMessage::State {
            board: Board::new(),
            turn: Seat::First,
        }
    }

    #[test]
    fn test_registry_creation() {
        let registry = Registry::new();
        assert_eq!(registry.occupied(), 0);
        assert!(!registry.state().active);
    }

    #[test]
    fn test_first_connection_waits_for_peer() {
        let mut registry = Registry::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let (id, seat) = registry.seat_connection(test_addr(), tx).unwrap();

        assert_eq!(id, 1);
        assert_eq!(seat, Seat::First);
        assert!(!registry.state().active);
        assert_eq!(drain(&mut rx), vec![ServerMessage::Id(Seat::First)]);
    }

    #[test]
    fn test_second_connection_starts_match() {
        let mut registry = Registry::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        registry.seat_connection(test_addr(), tx1).unwrap();
        let (_, seat) = registry.seat_connection(test_addr2(), tx2).unwrap();

        assert_eq!(seat, Seat::Second);
        assert!(registry.state().active);
        assert_eq!(
            drain(&mut rx1),
            vec![ServerMessage::Id(Seat::First), opening_state()]
        );
        assert_eq!(
            drain(&mut rx2),
            vec![ServerMessage::Id(Seat::Second), opening_state()]
        );
    }

    #[test]
    fn test_third_connection_rejected() {
        let mut room = full_room();
        let (tx3, mut rx3) = mpsc::unbounded_channel();

        let result = room.registry.seat_connection("127.0.0.1:8082".parse().unwrap(), tx3);

        assert_eq!(result, Err(RegistryError::SeatUnavailable));
        assert_eq!(room.registry.occupied(), 2);
        assert_eq!(room.registry.slot(Seat::First).unwrap().connection, room.first.0);
        assert!(drain(&mut rx3).is_empty());
        assert!(drain(&mut room.first.1).is_empty());
    }

    #[test]
    fn test_move_broadcasts_state_to_both() {
        let mut room = full_room();

        room.registry
            .handle_command(room.first.0, Seat::First, ClientMessage::Move { position: 4 })
            .unwrap();

        let mut board = Board::new();
        board.place(4, Seat::First);
        let expected = vec![ServerMessage::State {
            board,
            turn: Seat::Second,
        }];
        assert_eq!(drain(&mut room.first.1), expected);
        assert_eq!(drain(&mut room.second.1), expected);
    }

    #[test]
    fn test_rejected_move_is_silent() {
        let mut room = full_room();

        let result =
            room.registry
                .handle_command(room.second.0, Seat::Second, ClientMessage::Move { position: 0 });

        assert_eq!(result, Err(RegistryError::Move(MoveError::NotYourTurn)));
        assert_eq!(room.registry.state().board, Board::new());
        assert!(drain(&mut room.first.1).is_empty());
        assert!(drain(&mut room.second.1).is_empty());
    }

    #[test]
    fn test_winning_move_broadcasts_result() {
        let mut room = full_room();
        for (seat, pos) in [(Seat::First, 0), (Seat::Second, 3), (Seat::First, 1), (Seat::Second, 4)] {
            room.registry.apply_move(seat, pos).unwrap();
        }
        drain(&mut room.second.1);

        let outcome = room.registry.apply_move(Seat::First, 2).unwrap();

        assert_eq!(outcome, Some(Outcome::Win(Seat::First)));
        assert!(!room.registry.state().active);
        let messages = drain(&mut room.second.1);
        assert_eq!(messages.len(), 2);
        assert!(matches!(messages[0], ServerMessage::State { turn: Seat::First, .. }));
        assert_eq!(messages[1], ServerMessage::Result(Outcome::Win(Seat::First)));
    }

    #[test]
    fn test_reset_only_by_seat_zero_after_match() {
        let mut room = full_room();

        // Refused while the match is still in play.
        assert_eq!(room.registry.reset(Seat::First), Err(RegistryError::ResetRefused(Seat::First)));

        for (seat, pos) in [(Seat::First, 0), (Seat::Second, 3), (Seat::First, 1), (Seat::Second, 4), (Seat::First, 2)] {
            room.registry.apply_move(seat, pos).unwrap();
        }
        drain(&mut room.first.1);
        drain(&mut room.second.1);

        assert_eq!(room.registry.reset(Seat::Second), Err(RegistryError::ResetRefused(Seat::Second)));
        assert!(!room.registry.state().active);

        room.registry
            .handle_command(room.first.0, Seat::First, ClientMessage::Reset)
            .unwrap();

        assert_eq!(*room.registry.state(), MatchState::started());
        assert_eq!(
            drain(&mut room.second.1),
            vec![ServerMessage::Reset, opening_state()]
        );
    }

    #[test]
    fn test_disconnect_notifies_peer() {
        let mut room = full_room();
        room.registry.apply_move(Seat::First, 4).unwrap();
        drain(&mut room.second.1);

        assert!(room.registry.release_seat(room.first.0, Seat::First));

        assert!(room.registry.slot(Seat::First).is_none());
        assert!(!room.registry.state().active);
        assert_eq!(
            drain(&mut room.second.1),
            vec![ServerMessage::Disconnect(Seat::First)]
        );
    }

    #[test]
    fn test_stale_connection_ignored() {
        let mut room = full_room();
        room.registry.release_seat(room.first.0, Seat::First);

        let (tx3, _rx3) = mpsc::unbounded_channel();
        let (new_id, seat) = room.registry.seat_connection(test_addr(), tx3).unwrap();
        assert_eq!(seat, Seat::First);
        assert_ne!(new_id, room.first.0);

        let result = room
            .registry
            .handle_command(room.first.0, Seat::First, ClientMessage::Move { position: 0 });
        assert_eq!(
            result,
            Err(RegistryError::StaleConnection {
                connection: room.first.0,
                seat: Seat::First
            })
        );
        assert!(!room.registry.release_seat(room.first.0, Seat::First));
        assert_eq!(room.registry.state().board.get(0), Some(Cell::Empty));
    }

    #[test]
    fn test_reseat_after_disconnect_starts_fresh_match() {
        let mut room = full_room();
        room.registry.apply_move(Seat::First, 4).unwrap();
        room.registry.release_seat(room.second.0, Seat::Second);
        drain(&mut room.first.1);

        // Freed seat cannot be moved for, and seat 0 alone cannot reset.
        assert_eq!(
            room.registry.apply_move(Seat::First, 0),
            Err(RegistryError::Move(MoveError::NotActive))
        );
        assert_eq!(room.registry.reset(Seat::First), Err(RegistryError::ResetRefused(Seat::First)));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let (_, seat) = room.registry.seat_connection(test_addr2(), tx).unwrap();

        assert_eq!(seat, Seat::Second);
        assert_eq!(*room.registry.state(), MatchState::started());
        assert_eq!(drain(&mut room.first.1), vec![opening_state()]);
        assert_eq!(drain(&mut rx), vec![ServerMessage::Id(Seat::Second), opening_state()]);
    }

    #[test]
    fn test_broadcast_survives_closed_outbox() {
        let mut room = full_room();
        let (_, rx1) = room.first;
        drop(rx1);

        room.registry.apply_move(Seat::First, 0).unwrap();

        assert_eq!(drain(&mut room.second.1).len(), 1);
    }
}
