use beam_core::PeerId;

/// Member set of one room, kept in join order.
#[derive(Debug, Default, Clone)]
pub struct Room {
    members: Vec<PeerId>,
}

impl Room {
    pub fn members(&self) -> &[PeerId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, peer_id: &PeerId) -> bool {
        self.members.contains(peer_id)
    }

    /// Returns false when the peer was already a member.
    pub(crate) fn insert(&mut self, peer_id: PeerId) -> bool {
        if self.contains(&peer_id) {
            return false;
        }
        self.members.push(peer_id);
        true
    }

    pub(crate) fn remove(&mut self, peer_id: &PeerId) -> bool {
        let before = self.members.len();
        self.members.retain(|p| p != peer_id);
        self.members.len() != before
    }

    /// Everyone except `peer_id`.
    pub fn others(&self, peer_id: &PeerId) -> Vec<PeerId> {
        self.members
            .iter()
            .filter(|p| *p != peer_id)
            .cloned()
            .collect()
    }
}
