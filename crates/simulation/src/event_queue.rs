//! Ordering key for the simulation event queue.

use crate::NodeIndex;
use std::time::Duration;
use tokoin_core::{Event, EventPriority};

/// Position of an event in the global queue.
///
/// Events are ordered by delivery time, then priority, then node, then the
/// order they were scheduled in, so a run is fully determined by its seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventKey {
    pub time: Duration,
    pub priority: EventPriority,
    pub node_index: NodeIndex,
    pub sequence: u64,
}

impl EventKey {
    pub fn new(time: Duration, event: &Event, node_index: NodeIndex, sequence: u64) -> Self {
        Self {
            time,
            priority: event.priority(),
            node_index,
            sequence,
        }
    }
}
