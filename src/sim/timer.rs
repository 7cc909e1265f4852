//! One-shot deferred events on the fixed-tick clock
//!
//! Delays are rounded to whole ticks so "N seconds later" always means the
//! same tick count. Pending events belong to their owner and are dropped with
//! it; `clear` on teardown guarantees nothing fires against dead state.

/// A single pending event
#[derive(Debug, Clone)]
struct Pending<E> {
    due_tick: u64,
    event: E,
}

#[derive(Debug, Clone)]
pub struct Timers<E> {
    pending: Vec<Pending<E>>,
    tick_seconds: f64,
}

impl<E> Timers<E> {
    pub fn new(tick_seconds: f64) -> Self {
        Self {
            pending: Vec::new(),
            tick_seconds,
        }
    }

    /// Convert a delay in seconds to whole ticks (at least one)
    pub fn delay_ticks(&self, delay_secs: f64) -> u64 {
        ((delay_secs / self.tick_seconds).round() as u64).max(1)
    }

    /// Fire `event` once, `delay_secs` after tick `now`
    pub fn schedule_once(&mut self, now: u64, delay_secs: f64, event: E) -> u64 {
        let due_tick = now + self.delay_ticks(delay_secs);
        self.pending.push(Pending { due_tick, event });
        due_tick
    }

    /// Drop pending events matching `pred`
    pub fn cancel(&mut self, mut pred: impl FnMut(&E) -> bool) {
        self.pending.retain(|p| !pred(&p.event));
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_scheduled(&self, mut pred: impl FnMut(&E) -> bool) -> bool {
        self.pending.iter().any(|p| pred(&p.event))
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Remove and return events due at or before tick `now`, in due order
    /// (ties keep scheduling order)
    pub fn drain_due(&mut self, now: u64) -> Vec<E> {
        let mut due = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].due_tick <= now {
                due.push(self.pending.remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by_key(|p| p.due_tick);
        due.into_iter().map(|p| p.event).collect()
    }
}
