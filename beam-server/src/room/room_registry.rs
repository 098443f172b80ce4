use crate::room::Room;
use beam_core::{PeerId, RoomId};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JoinError {
    #[error("room '{room_id}' is full ({capacity} participants)")]
    RoomFull { room_id: RoomId, capacity: usize },
}

/// Result of a successful join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub room_id: RoomId,
    /// Members that were already present and must learn about the newcomer.
    pub notify: Vec<PeerId>,
    /// Set when the join moved the peer out of another room.
    pub previous: Option<LeaveOutcome>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveOutcome {
    pub room_id: RoomId,
    pub remaining: Vec<PeerId>,
}

/// Room → members map plus the reverse index used on disconnect.
///
/// Every participant is in at most one room, and a room with no members is
/// dropped from the map as soon as its last member leaves.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: HashMap<RoomId, Room>,
    memberships: HashMap<PeerId, RoomId>,
    capacity: usize,
}

impl RoomRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: HashMap::new(),
            memberships: HashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn join(&mut self, peer_id: PeerId, room_id: RoomId) -> Result<JoinOutcome, JoinError> {
        if self.memberships.get(&peer_id) == Some(&room_id) {
            return Ok(JoinOutcome {
                room_id,
                notify: Vec::new(),
                previous: None,
            });
        }

        let occupied = self.rooms.get(&room_id).map(Room::len).unwrap_or(0);
        if occupied >= self.capacity {
            return Err(JoinError::RoomFull {
                room_id,
                capacity: self.capacity,
            });
        }

        let previous = self.leave(&peer_id);

        let room = self.rooms.entry(room_id.clone()).or_default();
        let notify = room.others(&peer_id);
        room.insert(peer_id.clone());
        self.memberships.insert(peer_id, room_id.clone());

        Ok(JoinOutcome {
            room_id,
            notify,
            previous,
        })
    }

    pub fn leave(&mut self, peer_id: &PeerId) -> Option<LeaveOutcome> {
        let room_id = self.memberships.remove(peer_id)?;
        let room = self.rooms.get_mut(&room_id)?;
        room.remove(peer_id);

        let remaining = room.members().to_vec();
        if room.is_empty() {
            self.rooms.remove(&room_id);
        }

        Some(LeaveOutcome { room_id, remaining })
    }

    /// Members of `room_id` other than `sender`; empty for an unknown room.
    pub fn recipients(&self, sender: &PeerId, room_id: &RoomId) -> Vec<PeerId> {
        self.rooms
            .get(room_id)
            .map(|room| room.others(sender))
            .unwrap_or_default()
    }

    pub fn members(&self, room_id: &RoomId) -> Vec<PeerId> {
        self.rooms
            .get(room_id)
            .map(|room| room.members().to_vec())
            .unwrap_or_default()
    }

    pub fn room_of(&self, peer_id: &PeerId) -> Option<&RoomId> {
        self.memberships.get(peer_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(beam_core::utils::DEFAULT_ROOM_CAPACITY)
    }
}
