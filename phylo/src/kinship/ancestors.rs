//! Shortest upward distances from one member to each of its ancestors

use std::collections::BTreeMap;

use crate::models::MemberId;

/// Result of a breadth-first walk up the parent edges from `origin`.
///
/// The origin itself is recorded at distance 0. Every other entry maps an
/// ancestor to the minimum number of parent hops, and remembers which member
/// it was first reached from so the path can be rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AncestorMap {
    origin: MemberId,
    distances: BTreeMap<MemberId, u32>,
    via: BTreeMap<MemberId, MemberId>,
}

impl AncestorMap {
    pub(crate) fn new(origin: MemberId) -> Self {
        let mut distances = BTreeMap::new();
        distances.insert(origin.clone(), 0);
        Self {
            origin,
            distances,
            via: BTreeMap::new(),
        }
    }

    /// Record `ancestor` if unseen. Returns false when it was already reached
    /// at an equal or shorter distance.
    pub(crate) fn record(&mut self, ancestor: &MemberId, distance: u32, from: &MemberId) -> bool {
        if self.distances.contains_key(ancestor) {
            return false;
        }
        self.distances.insert(ancestor.clone(), distance);
        self.via.insert(ancestor.clone(), from.clone());
        true
    }

    pub fn origin(&self) -> &MemberId {
        &self.origin
    }

    pub fn distance(&self, member: &MemberId) -> Option<u32> {
        self.distances.get(member).copied()
    }

    pub fn contains(&self, member: &MemberId) -> bool {
        self.distances.contains_key(member)
    }

    /// Ancestors and their distances, excluding the origin, in id order
    pub fn ancestors(&self) -> impl Iterator<Item = (&MemberId, u32)> {
        self.distances
            .iter()
            .filter(|(id, _)| **id != self.origin)
            .map(|(id, d)| (id, *d))
    }

    /// Entries including the origin at distance 0, in id order
    pub fn entries(&self) -> impl Iterator<Item = (&MemberId, u32)> {
        self.distances.iter().map(|(id, d)| (id, *d))
    }

    /// Number of proper ancestors
    pub fn len(&self) -> usize {
        self.distances.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Path `[origin, ..., ancestor]` along the recorded shortest chain
    pub fn path_to(&self, ancestor: &MemberId) -> Option<Vec<MemberId>> {
        if !self.distances.contains_key(ancestor) {
            return None;
        }

        let mut path = vec![ancestor.clone()];
        let mut current = ancestor;
        while current != &self.origin {
            current = self.via.get(current)?;
            path.push(current.clone());
        }
        path.reverse();
        Some(path)
    }
}
