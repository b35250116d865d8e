//! The cooperative event kernel.
//!
//! One fixed-capacity FIFO carries every deferred piece of work in the stack:
//! interrupt handlers and protocol code [`post`] events, and a superloop
//! [`dispatch`]es them one at a time. Posting to a full queue is rejected
//! rather than blocking: dropping an event inside a radio interrupt is
//! recoverable, waiting there is not. A lost-event counter records the
//! rejection.
//!
//! The queue head, tail and counters are the only shared state; they are
//! mutated inside critical sections. Event execution itself is never
//! serialized by the kernel: the dispatching superloop runs handlers outside
//! any critical section.
//!
//! [`post`]: EventQueue::post
//! [`dispatch`]: EventQueue::dispatch

use core::cell::RefCell;

use critical_section::Mutex;
use heapless::Deque;

struct QueueState<E, const N: usize> {
    events: Deque<E, N>,
    lost: u32,
}

/// A fixed-capacity FIFO of pending events.
///
/// `post` may be called from interrupt context while the superloop is inside
/// `dispatch`; the internal state is guarded by critical sections.
pub struct EventQueue<E, const N: usize> {
    state: Mutex<RefCell<QueueState<E, N>>>,
}

impl<E, const N: usize> EventQueue<E, N> {
    /// Create a new, empty [`EventQueue`].
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(QueueState {
                events: Deque::new(),
                lost: 0,
            })),
        }
    }

    /// Append an event to the queue.
    ///
    /// Returns `false` if the queue is full, in which case the event is
    /// dropped and the lost-event counter is incremented.
    pub fn post(&self, event: E) -> bool {
        critical_section::with(|cs| {
            let mut state = self.state.borrow_ref_mut(cs);
            match state.events.push_back(event) {
                Ok(()) => true,
                Err(_) => {
                    state.lost = state.lost.saturating_add(1);
                    false
                }
            }
        })
    }

    /// Remove and return the oldest pending event, or `None` when the queue
    /// is empty. Never blocks.
    pub fn dispatch(&self) -> Option<E> {
        critical_section::with(|cs| self.state.borrow_ref_mut(cs).events.pop_front())
    }

    /// Discard every pending event.
    pub fn flush(&self) {
        critical_section::with(|cs| self.state.borrow_ref_mut(cs).events.clear());
    }

    /// Return the number of pending events.
    pub fn len(&self) -> usize {
        critical_section::with(|cs| self.state.borrow_ref(cs).events.len())
    }

    /// Returns `true` when no event is pending.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the number of events rejected because the queue was full.
    pub fn lost_events(&self) -> u32 {
        critical_section::with(|cs| self.state.borrow_ref(cs).lost)
    }
}

impl<E, const N: usize> Default for EventQueue<E, N> {
    fn default() -> Self {
        Self::new()
    }
}
