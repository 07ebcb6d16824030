//! Timed event scheduling.
//!
//! An [`EventChannel`] is a FIFO queue of [`TimedBatch`]es plus one clock.
//! A session owns two channels (keys, mouse) sharing this one implementation.
//! The channel knows nothing about collaborators; dispatch is a closure the
//! session supplies.
//!
//! Timing is chained relative delay: each batch's wait is measured from the
//! dispatch instant of the previous batch, or from the `execute` call instant
//! for the first. Blocking execution waits out each delay on the calling
//! thread; non-blocking execution only queues, and [`EventChannel::tick`]
//! drains whichever prefix of the queue has become ready.

use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::clock::ChannelClock;
use crate::events::TimedBatch;

/// One queue-plus-clock pair.
#[derive(Debug)]
pub struct EventChannel<E> {
    queue: VecDeque<TimedBatch<E>>,
    clock: ChannelClock,
}

impl<E> Default for EventChannel<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventChannel<E> {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            clock: ChannelClock::new(),
        }
    }

    /// Execute or schedule a list of timed batches.
    ///
    /// The channel clock restarts immediately in either mode. In blocking
    /// mode every batch is dispatched in input order, each after its delay
    /// has elapsed on this channel's clock, and the call returns only after
    /// the last dispatch. In non-blocking mode nothing is dispatched here:
    /// with `append` unset the existing queue is discarded first (dropping
    /// any not-yet-sent batches), then the new batches join the tail in
    /// input order.
    pub fn execute<F>(&mut self, batches: Vec<TimedBatch<E>>, append: bool, blocking: bool, mut dispatch: F)
    where
        F: FnMut(&[E]),
    {
        self.clock.restart();

        if blocking {
            for batch in &batches {
                self.wait_for(batch.delay_before());
                dispatch(batch.events());
                self.clock.restart();
            }
            return;
        }

        if !append {
            if !self.queue.is_empty() {
                debug!(dropped = self.queue.len(), "replacing queued batches");
            }
            self.queue.clear();
        }
        self.queue.extend(batches);
    }

    /// Dispatch every batch at the front of the queue whose delay has
    /// elapsed.
    ///
    /// The clock restarts after each dispatch and the front batch's delay is
    /// re-checked against the restarted clock, so a run of already-satisfied
    /// delays (zero delays in particular) drains in a single call, while the
    /// first unelapsed delay stops the drain.
    pub fn tick<F>(&mut self, mut dispatch: F)
    where
        F: FnMut(&[E]),
    {
        while let Some(front) = self.queue.front() {
            if self.clock.elapsed() < front.delay_before() {
                break;
            }
            debug!("delay elapsed, dispatching queued batch");
            let batch = match self.queue.pop_front() {
                Some(batch) => batch,
                None => break,
            };
            dispatch(batch.events());
            self.clock.restart();
        }
    }

    /// Whether any batches are still queued.
    pub fn has_events(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Number of queued batches.
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Sleep until the channel clock reaches `delay`.
    ///
    /// Deadline-based rather than a busy spin; the release condition is still
    /// the clock's elapsed time, re-checked after every sleep.
    fn wait_for(&self, delay: Duration) {
        loop {
            let elapsed = self.clock.elapsed();
            if elapsed >= delay {
                return;
            }
            thread::sleep(delay - elapsed);
        }
    }
}
