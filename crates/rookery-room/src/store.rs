//! The room store: every live room, keyed by code.
//!
//! # Locking
//!
//! ```text
//! rooms  : RwLock<HashMap<RoomCode, Arc<Mutex<Option<Room>>>>>
//! index  : RwLock<HashMap<ConnectionId, RoomCode>>
//! ```
//!
//! Each room has its own mutex, so two rooms never contend. The table
//! lock is only held long enough to look up or insert/remove a cell; it is
//! released before a room lock is awaited. When a room lock is held, the
//! table and index locks may be taken inside it, never the other way
//! round.
//!
//! The index is only written when membership changes (create, join,
//! leave, delete). Moves, draw offers and resignations read it at most
//! once, outside any room lock, to find the caller's room.
//!
//! A deleted room's cell is set to `None` before it leaves the table.
//! Anyone who grabbed the cell just before deletion finds it empty and
//! reports the room as not found.

use std::collections::HashMap;
use std::sync::Arc;

use rand::Rng;
use rookery_protocol::RoomCode;
use rookery_transport::ConnectionId;
use tokio::sync::{Mutex, RwLock};

use crate::{Room, RoomConfig, RoomError, RoomInfo, Rules};

/// Lowest code handed out. Codes never start with a zero.
const CODE_MIN: u16 = 1000;
/// Highest code handed out.
const CODE_MAX: u16 = 9999;

type RoomCell<R> = Arc<Mutex<Option<Room<R>>>>;

/// Shared table of live rooms plus the connection → room reverse index.
pub struct RoomStore<R: Rules> {
    rooms: RwLock<HashMap<RoomCode, RoomCell<R>>>,
    index: RwLock<HashMap<ConnectionId, RoomCode>>,
    config: RoomConfig,
}

impl<R: Rules> RoomStore<R> {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            index: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Allocates a fresh code and inserts the room `open` builds for it.
    ///
    /// `open` runs before the room is visible to anyone else, so whatever
    /// it sends reaches the host ahead of any event from a joiner. Every
    /// member of the new room is indexed.
    ///
    /// # Errors
    /// [`RoomError::CodesExhausted`] if all codes are taken.
    pub async fn create<F>(&self, open: F) -> Result<RoomCode, RoomError>
    where
        F: FnOnce(RoomCode) -> Room<R> + Send,
    {
        let mut rooms = self.rooms.write().await;
        let code = draw_code(&*rooms, self.config.code_draw_attempts)
            .ok_or(RoomError::CodesExhausted)?;

        let room = open(code.clone());
        let members: Vec<ConnectionId> = room.members().collect();
        rooms.insert(code.clone(), Arc::new(Mutex::new(Some(room))));

        let mut index = self.index.write().await;
        for conn in members {
            index.insert(conn, code.clone());
        }
        tracing::info!(%code, rooms = rooms.len(), "room created");
        Ok(code)
    }

    /// Runs `f` against the room while holding its lock.
    ///
    /// Afterwards the reverse index is brought in line with whoever is
    /// seated, and a room left with no players is deleted. This happens
    /// whether `f` succeeded or not.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] if no live room has `code`, otherwise
    /// whatever `f` returns.
    pub async fn mutate<T, F>(&self, code: &RoomCode, f: F) -> Result<T, RoomError>
    where
        F: FnOnce(&mut Room<R>) -> Result<T, RoomError> + Send,
        T: Send,
    {
        let cell = self
            .cell(code)
            .await
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        let mut slot = cell.lock().await;
        let room = slot
            .as_mut()
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;

        let before = sorted_members(room);
        let result = f(room);
        let after = sorted_members(room);
        let empty = room.is_empty();

        if before != after {
            self.reindex(code, &before, &after).await;
        }
        if empty {
            *slot = None;
            self.remove_cell(code).await;
        }
        result
    }

    /// Like [`mutate`](Self::mutate), for the room `conn` is seated in.
    ///
    /// # Errors
    /// [`RoomError::NotInRoom`] if `conn` is not in any room.
    pub async fn mutate_for<T, F>(&self, conn: ConnectionId, f: F) -> Result<T, RoomError>
    where
        F: FnOnce(&mut Room<R>) -> Result<T, RoomError> + Send,
        T: Send,
    {
        let code = self
            .room_of(&conn)
            .await
            .ok_or(RoomError::NotInRoom(conn))?;
        self.mutate(&code, |room| {
            if !room.contains(&conn) {
                return Err(RoomError::NotInRoom(conn));
            }
            f(room)
        })
        .await
    }

    /// A snapshot of the room, or `None` if it does not exist.
    pub async fn get(&self, code: &RoomCode) -> Option<RoomInfo<R::Position>> {
        let cell = self.cell(code).await?;
        let slot = cell.lock().await;
        slot.as_ref().map(Room::info)
    }

    /// Deletes a room outright, unindexing its players.
    ///
    /// Returns `false` if the room did not exist. Deleting twice is fine.
    pub async fn delete(&self, code: &RoomCode) -> bool {
        let Some(cell) = self.cell(code).await else {
            return false;
        };
        let mut slot = cell.lock().await;
        let Some(room) = slot.take() else {
            return false;
        };
        let members: Vec<ConnectionId> = room.members().collect();
        self.reindex(code, &members, &[]).await;
        self.remove_cell(code).await;
        true
    }

    /// The code of the room `conn` is seated in.
    pub async fn room_of(&self, conn: &ConnectionId) -> Option<RoomCode> {
        self.index.read().await.get(conn).cloned()
    }

    /// Number of live rooms.
    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }

    async fn cell(&self, code: &RoomCode) -> Option<RoomCell<R>> {
        self.rooms.read().await.get(code).cloned()
    }

    async fn remove_cell(&self, code: &RoomCode) {
        let mut rooms = self.rooms.write().await;
        rooms.remove(code);
        tracing::info!(%code, rooms = rooms.len(), "room deleted");
    }

    async fn reindex(&self, code: &RoomCode, before: &[ConnectionId], after: &[ConnectionId]) {
        let joined = after.iter().filter(|c| !before.contains(c));
        let left = before.iter().filter(|c| !after.contains(c));

        let mut index = self.index.write().await;
        for conn in joined {
            index.insert(*conn, code.clone());
        }
        for conn in left {
            if index.get(conn) == Some(code) {
                index.remove(conn);
            }
        }
    }
}

fn sorted_members<R: Rules>(room: &Room<R>) -> Vec<ConnectionId> {
    let mut members: Vec<ConnectionId> = room.members().collect();
    members.sort();
    members
}

/// Picks an unused code: a few random draws, then a scan of the range.
fn draw_code<V>(taken: &HashMap<RoomCode, V>, attempts: usize) -> Option<RoomCode> {
    let mut rng = rand::rng();
    for _ in 0..attempts {
        let code = RoomCode::from_number(rng.random_range(CODE_MIN..=CODE_MAX));
        if !taken.contains_key(&code) {
            return Some(code);
        }
    }
    (CODE_MIN..=CODE_MAX)
        .map(RoomCode::from_number)
        .find(|code| !taken.contains_key(code))
}
