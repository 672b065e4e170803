//! Known peer addresses.

use indexmap::IndexSet;
use tracing::debug;

/// Addresses this node gossips with, in discovery order.
///
/// The first known peer acts as the seed: new nodes announce themselves
/// to it and it relays transaction inventories to everyone else. If the
/// seed becomes unreachable the next peer takes its place.
#[derive(Debug, Clone)]
pub struct PeerRegistry {
    peers: IndexSet<String>,
}

impl PeerRegistry {
    /// A registry that initially knows only the seed.
    pub fn new(seed: impl Into<String>) -> Self {
        let mut peers = IndexSet::new();
        peers.insert(seed.into());
        Self { peers }
    }

    /// The current seed, if any peer is known.
    pub fn seed(&self) -> Option<&str> {
        self.peers.first().map(String::as_str)
    }

    pub fn is_seed(&self, address: &str) -> bool {
        self.seed() == Some(address)
    }

    /// Add a peer. Returns `false` if it was already known.
    pub fn add(&mut self, address: impl Into<String>) -> bool {
        let address = address.into();
        if self.peers.contains(&address) {
            return false;
        }
        debug!(peer = %address, known = self.peers.len() + 1, "Peer added");
        self.peers.insert(address)
    }

    /// Forget a peer that could not be reached.
    pub fn remove(&mut self, address: &str) -> bool {
        let removed = self.peers.shift_remove(address);
        if removed {
            debug!(peer = %address, known = self.peers.len(), "Peer removed");
        }
        removed
    }

    pub fn contains(&self, address: &str) -> bool {
        self.peers.contains(address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.peers.iter().map(String::as_str)
    }

    /// Every known peer except the listed ones.
    pub fn others<'a>(&'a self, exclude: &'a [&'a str]) -> impl Iterator<Item = &'a str> + 'a {
        self.iter().filter(move |peer| !exclude.contains(peer))
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}
