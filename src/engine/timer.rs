//! Coarse one-shot timers for the control loop.
//!
//! The driving timer of the lookahead scheduler lives here. It is allowed to
//! be late: nothing that needs precision is ever derived from the moment a
//! timer fires.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Something the scheduler can re-arm itself on.
pub trait DrivingTimer {
    fn arm(&mut self, delay: Duration) -> TimerId;
    fn cancel(&mut self, id: TimerId);
}

#[derive(Debug)]
struct Entry<T> {
    deadline: f64,
    id: TimerId,
    payload: T,
}

// Ordered by deadline, then by arming order.
impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.deadline
            .total_cmp(&other.deadline)
            .then(self.id.cmp(&other.id))
    }
}

/// Pending timers ordered by deadline (seconds, clock domain).
#[derive(Debug)]
pub struct TimerQueue<T> {
    heap: BinaryHeap<Reverse<Entry<T>>>,
    cancelled: HashSet<TimerId>,
    next_id: u64,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            cancelled: HashSet::new(),
            next_id: 0,
        }
    }

    pub fn arm(&mut self, deadline: f64, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.heap.push(Reverse(Entry {
            deadline,
            id,
            payload,
        }));
        id
    }

    pub fn cancel(&mut self, id: TimerId) {
        if self.heap.iter().any(|Reverse(e)| e.id == id) {
            self.cancelled.insert(id);
        }
    }

    /// Earliest deadline of a timer that will still fire
    pub fn next_deadline(&mut self) -> Option<f64> {
        self.discard_cancelled();
        self.heap.peek().map(|Reverse(e)| e.deadline)
    }

    /// Pop the earliest timer whose deadline is at or before `now`
    pub fn pop_due(&mut self, now: f64) -> Option<(TimerId, T)> {
        self.discard_cancelled();
        match self.heap.peek() {
            Some(Reverse(e)) if e.deadline <= now => {
                let Reverse(entry) = self.heap.pop()?;
                Some((entry.id, entry.payload))
            }
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len() - self.cancelled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn discard_cancelled(&mut self) {
        while let Some(Reverse(e)) = self.heap.peek() {
            if !self.cancelled.remove(&e.id) {
                break;
            }
            self.heap.pop();
        }
    }
}

/// Arms timers on a queue relative to a fixed "now", all with the same payload.
///
/// This is how a component that only knows about delays gets its timers
/// into the control loop's queue.
pub struct ArmAt<'a, T: Clone> {
    pub queue: &'a mut TimerQueue<T>,
    pub now: f64,
    pub payload: T,
}

impl<T: Clone> DrivingTimer for ArmAt<'_, T> {
    fn arm(&mut self, delay: Duration) -> TimerId {
        self.queue
            .arm(self.now + delay.as_secs_f64(), self.payload.clone())
    }

    fn cancel(&mut self, id: TimerId) {
        self.queue.cancel(id);
    }
}
