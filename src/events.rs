//! Interrupt-driven sensor edge channel.
//!
//! Edges are produced by the PIR GPIO ISRs and consumed by a single task
//! that feeds them, one at a time, into the classifier.
//!
//! ```text
//! ┌─────────────┐  try_push  ┌──────────────────┐  next().await  ┌──────────────┐
//! │ PIR A ISR   │───────────▶│                  │───────────────▶│ Edge consumer│
//! │ PIR B ISR   │───────────▶│ EdgeChannel (50) │                │ (one event   │
//! └─────────────┘            └──────────────────┘                │  at a time)  │
//!                                                                └──────────────┘
//! ```
//!
//! Producers never wait: a full channel drops the edge and counts it.  The
//! classifier already tolerates missed edges through its reject-and-reset
//! path, so lossy delivery is acceptable here.

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::fsm::states::EventId;

/// Maximum number of edges buffered between ISR and consumer.
pub const EDGE_CHANNEL_DEPTH: usize = 50;

pub struct EdgeChannel {
    channel: Channel<CriticalSectionRawMutex, EventId, EDGE_CHANNEL_DEPTH>,
    dropped: AtomicU32,
}

impl EdgeChannel {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Queue an edge without blocking.
    ///
    /// Safe to call from ISR context: it takes a critical section and never
    /// logs or allocates.  Returns `false` if the edge was dropped.
    pub fn try_push(&self, event: EventId) -> bool {
        if self.channel.try_send(event).is_ok() {
            true
        } else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Wait for the next edge.
    pub async fn next(&self) -> EventId {
        self.channel.receive().await
    }

    pub fn try_next(&self) -> Option<EventId> {
        self.channel.try_receive().ok()
    }

    /// Edges dropped because the channel was full.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }
}

impl core::fmt::Debug for EdgeChannel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EdgeChannel")
            .field("len", &self.len())
            .field("dropped", &self.dropped())
            .finish()
    }
}

impl Default for EdgeChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Event consumer task: suspend until an edge arrives, hand it to
/// `handler`, repeat.  Only one edge is ever in flight.
pub async fn consume_edges(edges: &EdgeChannel, mut handler: impl FnMut(EventId)) -> ! {
    loop {
        let event = edges.next().await;
        handler(event);
    }
}
