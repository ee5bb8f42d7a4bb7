//! A single room: two seats, one position, one phase.
//!
//! Every transition method checks its preconditions, mutates the room, and
//! returns the events the transition produced along with who should get
//! them. Nothing here sends anything; the caller hands the list to
//! [`Room::dispatch`] while it still holds the room's lock, so events from
//! one room always reach its players in the order the room changed.

use std::collections::HashMap;

use rookery_protocol::{Color, EndReason, Event, GameResult, MoveSpec, RoomCode};
use rookery_session::Outbox;
use rookery_transport::ConnectionId;

use crate::{Recipient, RoomError, RoomPhase, Rules};

/// A room has exactly two seats.
pub(crate) const SEATS: usize = 2;

/// Events produced by one transition.
pub(crate) type Outgoing = Vec<(Recipient, Event)>;

/// A seated player.
#[derive(Debug, Clone)]
pub struct Seat {
    pub color: Color,
    pub display_name: String,
    pub(crate) outbox: Outbox,
}

/// A snapshot of one seat, without the outbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatInfo {
    pub connection: ConnectionId,
    pub color: Color,
    pub display_name: String,
}

/// A point-in-time copy of a room, safe to hold without any lock.
#[derive(Debug, Clone)]
pub struct RoomInfo<P> {
    pub code: RoomCode,
    pub phase: RoomPhase,
    /// Seats ordered White first.
    pub seats: Vec<SeatInfo>,
    pub position: P,
    pub pending_draw: Option<ConnectionId>,
    pub moves_played: usize,
}

/// One game between two connections.
#[derive(Debug)]
pub struct Room<R: Rules> {
    code: RoomCode,
    phase: RoomPhase,
    pub(crate) seats: HashMap<ConnectionId, Seat>,
    position: R::Position,
    /// The connection whose draw offer is waiting for an answer.
    pending_draw: Option<ConnectionId>,
    moves_played: usize,
}

impl<R: Rules> Room<R> {
    /// Opens a room with `host` seated as White.
    ///
    /// Returns the room and the `room_created` event for the host.
    pub fn open(
        code: RoomCode,
        host: ConnectionId,
        display_name: String,
        outbox: Outbox,
    ) -> (Self, Outgoing) {
        let mut seats = HashMap::with_capacity(SEATS);
        seats.insert(
            host,
            Seat {
                color: Color::White,
                display_name,
                outbox,
            },
        );

        let room = Self {
            code: code.clone(),
            phase: RoomPhase::Waiting,
            seats,
            position: R::initial_position(),
            pending_draw: None,
            moves_played: 0,
        };

        let events = vec![(
            Recipient::One(host),
            Event::RoomCreated {
                code,
                color: Color::White,
            },
        )];
        (room, events)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    pub fn position(&self) -> &R::Position {
        &self.position
    }

    pub fn pending_draw(&self) -> Option<ConnectionId> {
        self.pending_draw
    }

    pub fn moves_played(&self) -> usize {
        self.moves_played
    }

    pub fn seat(&self, conn: &ConnectionId) -> Option<&Seat> {
        self.seats.get(conn)
    }

    pub fn contains(&self, conn: &ConnectionId) -> bool {
        self.seats.contains_key(conn)
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn player_count(&self) -> usize {
        self.seats.len()
    }

    /// The connections currently seated, in no particular order.
    pub fn members(&self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.seats.keys().copied()
    }

    pub fn info(&self) -> RoomInfo<R::Position> {
        let mut seats: Vec<SeatInfo> = self
            .seats
            .iter()
            .map(|(id, seat)| SeatInfo {
                connection: *id,
                color: seat.color,
                display_name: seat.display_name.clone(),
            })
            .collect();
        seats.sort_by_key(|s| s.color != Color::White);

        RoomInfo {
            code: self.code.clone(),
            phase: self.phase,
            seats,
            position: self.position.clone(),
            pending_draw: self.pending_draw,
            moves_played: self.moves_played,
        }
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Seats `conn` as Black and starts the game.
    ///
    /// # Errors
    /// - [`RoomError::AlreadyInRoom`] if `conn` is the host
    /// - [`RoomError::RoomFull`] if both seats are taken or the room is
    ///   no longer waiting
    pub fn admit(
        &mut self,
        conn: ConnectionId,
        display_name: String,
        outbox: Outbox,
    ) -> Result<Outgoing, RoomError> {
        if self.contains(&conn) {
            return Err(RoomError::AlreadyInRoom(conn));
        }
        if !self.phase.is_joinable() || self.seats.len() >= SEATS {
            return Err(RoomError::RoomFull(self.code.clone()));
        }
        let host_name = self
            .seats
            .values()
            .next()
            .map(|seat| seat.display_name.clone())
            .ok_or_else(|| RoomError::NotFound(self.code.clone()))?;

        self.seats.insert(
            conn,
            Seat {
                color: Color::Black,
                display_name: display_name.clone(),
                outbox,
            },
        );
        self.advance(RoomPhase::Active);

        Ok(vec![
            (
                Recipient::One(conn),
                Event::RoomJoined {
                    code: self.code.clone(),
                    color: Color::Black,
                    opponent_name: host_name,
                },
            ),
            (
                Recipient::RoomExcept(conn),
                Event::OpponentJoined {
                    opponent_name: display_name,
                },
            ),
        ])
    }

    /// Plays a move for `conn`.
    ///
    /// Turn order is read from the position, never from the client. On
    /// success both players get the same `move_applied`; if the move ended
    /// the game, `game_ended` follows it.
    ///
    /// # Errors
    /// - [`RoomError::NotInGame`] unless the room is `Active`
    /// - [`RoomError::NotYourTurn`] if `conn` is not the side to move
    /// - [`RoomError::IllegalMove`] if the rules refuse the move
    pub fn play(&mut self, conn: ConnectionId, mv: MoveSpec) -> Result<Outgoing, RoomError> {
        if !self.phase.is_active() {
            return Err(RoomError::NotInGame);
        }
        let seat = self.seats.get(&conn).ok_or(RoomError::NotInRoom(conn))?;
        let to_move = R::side_to_move(&self.position);
        if seat.color != to_move {
            return Err(RoomError::NotYourTurn { to_move });
        }

        let applied = R::apply(&self.position, &mv)?;
        let mover_name = seat.display_name.clone();
        let mover_color = seat.color;

        self.position = applied.position;
        self.moves_played += 1;

        let mut events = vec![(
            Recipient::Room,
            Event::MoveApplied {
                from: mv.from,
                to: mv.to,
                promotion: mv.promotion_or_default(),
                mover_name,
                mover_color,
            },
        )];
        if let Some(outcome) = applied.outcome {
            events.extend(self.finish(outcome.result(), outcome.reason()));
        }
        Ok(events)
    }

    /// Records a draw offer from `conn` and tells the opponent.
    ///
    /// A repeated offer replaces the previous one.
    pub fn offer_draw(&mut self, conn: ConnectionId) -> Result<Outgoing, RoomError> {
        self.require_active_seat(&conn)?;
        self.pending_draw = Some(conn);
        Ok(vec![(Recipient::RoomExcept(conn), Event::DrawOffered)])
    }

    /// Answers the opponent's pending draw offer.
    ///
    /// # Errors
    /// [`RoomError::NoPendingDraw`] if there is no offer, or if the offer
    /// is `conn`'s own.
    pub fn respond_draw(
        &mut self,
        conn: ConnectionId,
        accept: bool,
    ) -> Result<Outgoing, RoomError> {
        self.require_active_seat(&conn)?;
        let offerer = match self.pending_draw {
            Some(offerer) if offerer != conn => offerer,
            _ => return Err(RoomError::NoPendingDraw),
        };
        self.pending_draw = None;

        let mut events = vec![(Recipient::One(offerer), Event::DrawResponse { accepted: accept })];
        if accept {
            events.extend(self.finish(GameResult::Draw, EndReason::DrawAgreement));
        }
        Ok(events)
    }

    /// Ends the game as a loss for `conn`.
    ///
    /// `reason` is [`EndReason::Resignation`] or [`EndReason::Timeout`];
    /// only a resignation sends `opponent_resigned` ahead of `game_ended`.
    pub fn concede(
        &mut self,
        conn: ConnectionId,
        reason: EndReason,
    ) -> Result<Outgoing, RoomError> {
        let color = self.require_active_seat(&conn)?.color;
        let mut events = Vec::with_capacity(2);
        if reason == EndReason::Resignation {
            events.push((Recipient::RoomExcept(conn), Event::OpponentResigned));
        }
        events.extend(self.finish(GameResult::win_for(color.opponent()), reason));
        Ok(events)
    }

    /// Removes `conn` from the room.
    ///
    /// The leaver's name and color are captured before the seat is
    /// removed, so the player left behind is told exactly who left. If the
    /// game was in progress it ends as a win for the remaining player.
    ///
    /// Returns the removed seat and the events for whoever is still here.
    pub fn depart(&mut self, conn: ConnectionId) -> Result<(Seat, Outgoing), RoomError> {
        let seat = self.seats.remove(&conn).ok_or(RoomError::NotInRoom(conn))?;
        if self.pending_draw == Some(conn) {
            self.pending_draw = None;
        }

        let mut events = Vec::with_capacity(2);
        if !self.seats.is_empty() {
            events.push((
                Recipient::Room,
                Event::OpponentDisconnected {
                    name: seat.display_name.clone(),
                    color: seat.color,
                },
            ));
        }
        if self.phase.is_active() {
            events.extend(self.finish(
                GameResult::win_for(seat.color.opponent()),
                EndReason::Disconnection,
            ));
        } else if self.seats.is_empty() {
            self.advance(RoomPhase::Finished);
        }
        Ok((seat, events))
    }

    /// Moves the room to `Finished`.
    ///
    /// Idempotent: only the first call produces a `game_ended`; later
    /// calls return `None` and change nothing.
    pub fn finish(&mut self, result: GameResult, reason: EndReason) -> Option<(Recipient, Event)> {
        if self.phase.is_finished() {
            return None;
        }
        self.advance(RoomPhase::Finished);
        self.pending_draw = None;
        tracing::info!(code = %self.code, ?result, ?reason, "game finished");
        Some((Recipient::Room, Event::GameEnded { result, reason }))
    }

    fn require_active_seat(&self, conn: &ConnectionId) -> Result<&Seat, RoomError> {
        let seat = self.seats.get(conn).ok_or(RoomError::NotInRoom(*conn))?;
        if !self.phase.is_active() {
            return Err(RoomError::NotInGame);
        }
        Ok(seat)
    }

    fn advance(&mut self, target: RoomPhase) {
        debug_assert!(
            self.phase.can_transition_to(target),
            "invalid phase transition {} -> {}",
            self.phase,
            target
        );
        tracing::debug!(code = %self.code, from = %self.phase, to = %target, "room phase changed");
        self.phase = target;
    }
}
