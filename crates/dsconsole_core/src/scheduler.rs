//! Deferred timer scheduler
//!
//! Components schedule fire-and-forget callbacks (such as the short guard
//! window after a typeahead commit) through a [`TimerHandle`]. The host owns
//! the [`TimerScheduler`] and drives its clock, either explicitly with
//! [`TimerScheduler::advance`] or from wall time with [`TimerScheduler::tick`].
//!
//! The clock is virtual: nothing fires until the host advances it, which keeps
//! every UI transition on the host's thread and makes timing fully
//! reproducible in tests.
//!
//! Handles hold only a weak reference, so a component outliving its scheduler
//! simply gets `None` back from [`TimerHandle::schedule`].

use slotmap::{new_key_type, SlotMap};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::{Duration, Instant};

new_key_type! {
    /// Handle to a scheduled callback
    pub struct TimerId;
}

/// Callback run when a timer fires
pub type DeferredFn = Box<dyn FnOnce() + Send>;

struct PendingTimer {
    due: Duration,
    seq: u64,
    callback: DeferredFn,
}

struct SchedulerInner {
    timers: SlotMap<TimerId, PendingTimer>,
    /// Virtual time since the scheduler was created
    now: Duration,
    /// Insertion counter, keeps firing order stable for equal deadlines
    next_seq: u64,
    last_tick: Instant,
}

fn lock(inner: &Mutex<SchedulerInner>) -> MutexGuard<'_, SchedulerInner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Owner of all pending deferred callbacks
pub struct TimerScheduler {
    inner: Arc<Mutex<SchedulerInner>>,
}

impl TimerScheduler {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(SchedulerInner {
                timers: SlotMap::with_key(),
                now: Duration::ZERO,
                next_seq: 0,
                last_tick: Instant::now(),
            })),
        }
    }

    /// Get a handle components can schedule through
    pub fn handle(&self) -> TimerHandle {
        TimerHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        lock(&self.inner).now
    }

    /// Number of callbacks still waiting to fire
    pub fn pending(&self) -> usize {
        lock(&self.inner).timers.len()
    }

    /// Advance the clock and run every callback that became due.
    ///
    /// Callbacks run in deadline order, outside the scheduler lock, so they may
    /// schedule or cancel other timers. Timers scheduled by a callback fire on a
    /// later advance. Returns the number of callbacks run.
    pub fn advance(&self, elapsed: Duration) -> usize {
        let due = {
            let mut inner = lock(&self.inner);
            inner.now += elapsed;
            let now = inner.now;

            let mut ready: Vec<(Duration, u64, TimerId)> = inner
                .timers
                .iter()
                .filter(|(_, timer)| timer.due <= now)
                .map(|(id, timer)| (timer.due, timer.seq, id))
                .collect();
            ready.sort_by_key(|(due, seq, _)| (*due, *seq));

            ready
                .into_iter()
                .filter_map(|(_, _, id)| inner.timers.remove(id))
                .map(|timer| timer.callback)
                .collect::<Vec<_>>()
        };

        let fired = due.len();
        if fired > 0 {
            tracing::trace!(fired, "deferred timers fired");
        }
        for callback in due {
            callback();
        }
        fired
    }

    /// Advance by the wall-clock time elapsed since the previous tick
    pub fn tick(&self) -> usize {
        let elapsed = {
            let mut inner = lock(&self.inner);
            let now = Instant::now();
            let elapsed = now.duration_since(inner.last_tick);
            inner.last_tick = now;
            elapsed
        };
        self.advance(elapsed)
    }

    /// Drop every pending callback without running it
    pub fn clear(&self) {
        lock(&self.inner).timers.clear();
    }
}

impl Default for TimerScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Weak, cloneable handle for scheduling deferred callbacks
#[derive(Clone)]
pub struct TimerHandle {
    inner: Weak<Mutex<SchedulerInner>>,
}

impl TimerHandle {
    /// Run `callback` once `delay` of virtual time has passed.
    ///
    /// Returns `None` when the scheduler no longer exists.
    pub fn schedule<F>(&self, delay: Duration, callback: F) -> Option<TimerId>
    where
        F: FnOnce() + Send + 'static,
    {
        let inner = self.inner.upgrade()?;
        let mut inner = lock(&inner);
        let due = inner.now + delay;
        let seq = inner.next_seq;
        inner.next_seq += 1;
        Some(inner.timers.insert(PendingTimer {
            due,
            seq,
            callback: Box::new(callback),
        }))
    }

    /// Cancel a pending callback. Returns true if it had not fired yet.
    pub fn cancel(&self, id: TimerId) -> bool {
        match self.inner.upgrade() {
            Some(inner) => lock(&inner).timers.remove(id).is_some(),
            None => false,
        }
    }

    /// Check whether the owning scheduler still exists
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}
