//! Bounded multi-producer message queues.
//!
//! ```text
//! ┌────────────┐
//! │ classifier │──┐
//! ├────────────┤  │  try_push   ┌────────────────┐ pop_if   ┌───────────┐
//! │ heartbeat  │──┼────────────▶│ OutboundQueue  │─────────▶│ scheduler │
//! ├────────────┤  │             │ (250 slots)    │          └───────────┘
//! │ commands   │──┘             └────────────────┘
//! └────────────┘
//! ```
//!
//! Producers never block: a full queue rejects the newest item and bumps
//! a drop counter.  The backing storage is a fixed `heapless::Deque`
//! behind an `embassy_sync` critical-section mutex, so a queue can live in
//! a `static` and be shared between FreeRTOS tasks.  A soft capacity at or
//! below the slot count is set from configuration at boot.

use core::cell::RefCell;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use heapless::Deque;
use log::debug;

/// Static slot count of the outbound queue.
pub const OUTBOUND_SLOTS: usize = 250;

/// Static slot count of the inbound queue.
pub const INBOUND_SLOTS: usize = 16;

/// Longest accepted outbound message, in bytes.
pub const MAX_MESSAGE_LEN: usize = 128;

/// Longest payload a LoRa packet can carry.
pub const MAX_PACKET_LEN: usize = 255;

/// Separator between messages in a batch frame.
pub const DELIMITER: char = '|';

pub type Message = heapless::String<MAX_MESSAGE_LEN>;
pub type Packet = heapless::Vec<u8, MAX_PACKET_LEN>;

pub type OutboundQueue = BoundedQueue<Message, OUTBOUND_SLOTS>;
pub type InboundQueue = BoundedQueue<Packet, INBOUND_SLOTS>;

/// Build a [`Message`], or `None` if `text` is empty, too long, or contains
/// the batch delimiter.
pub fn message(text: &str) -> Option<Message> {
    if text.is_empty() || text.contains(DELIMITER) {
        return None;
    }
    Message::try_from(text).ok()
}

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

pub struct BoundedQueue<T, const N: usize> {
    items: Mutex<CriticalSectionRawMutex, RefCell<Deque<T, N>>>,
    capacity: AtomicUsize,
    dropped: AtomicU32,
}

impl<T, const N: usize> BoundedQueue<T, N> {
    /// An empty queue using all `N` slots.
    pub const fn new() -> Self {
        Self {
            items: Mutex::new(RefCell::new(Deque::new())),
            capacity: AtomicUsize::new(N),
            dropped: AtomicU32::new(0),
        }
    }

    /// Limit the queue to `capacity` items (clamped to `1..=N`).
    ///
    /// Items already queued beyond the new limit stay until drained.
    pub fn set_capacity(&self, capacity: usize) {
        self.capacity.store(capacity.clamp(1, N), Ordering::Relaxed);
    }

    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Relaxed)
    }

    /// Append `item` unless the queue is full.  Never blocks.
    pub fn try_push(&self, item: T) -> bool {
        let cap = self.capacity();
        let accepted = self.items.lock(|q| {
            let mut q = q.borrow_mut();
            q.len() < cap && q.push_back(item).is_ok()
        });
        if !accepted {
            let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            debug!("queue full ({cap}), dropped newest item (total dropped: {total})");
        }
        accepted
    }

    /// Remove the oldest item.
    pub fn try_pop(&self) -> Option<T> {
        self.items.lock(|q| q.borrow_mut().pop_front())
    }

    /// Remove the oldest item only if `accept` says yes.  The check and the
    /// removal happen under one lock, so a rejected item stays at the front.
    pub fn try_pop_if(&self, accept: impl FnOnce(&T) -> bool) -> Option<T> {
        self.items.lock(|q| {
            let mut q = q.borrow_mut();
            if accept(q.front()?) { q.pop_front() } else { None }
        })
    }

    /// Take every item present right now, oldest first.
    ///
    /// Items pushed while the drain is in progress are left for the next
    /// drain.
    pub fn drain(&self) -> Drain<'_, T, N> {
        Drain {
            queue: self,
            remaining: self.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.items.lock(|q| q.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of items rejected because the queue was full.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl<const N: usize> BoundedQueue<Message, N> {
    /// Queue a telemetry string.  Returns `false` if the text is not a valid
    /// message or the queue is full.
    pub fn enqueue(&self, text: &str) -> bool {
        match message(text) {
            Some(m) => self.try_push(m),
            None => {
                debug!("rejected outbound message {text:?}");
                false
            }
        }
    }
}

impl<T, const N: usize> Default for BoundedQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator returned by [`BoundedQueue::drain`].
pub struct Drain<'a, T, const N: usize> {
    queue: &'a BoundedQueue<T, N>,
    remaining: usize,
}

impl<T, const N: usize> Iterator for Drain<'_, T, N> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.queue.try_pop()
    }
}
