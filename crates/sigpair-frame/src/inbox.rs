//! Bounded hand-off between the delivery context and the test context.
//!
//! The delivery side never blocks for long: a push waits at most
//! [`InboxConfig::push_timeout`] for a free slot and then drops the frame.
//! The consumer side blocks for as long as it likes.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tracing::{trace, warn};

use crate::codec::Frame;

/// Inbox sizing and delivery-side wait.
#[derive(Debug, Clone)]
pub struct InboxConfig {
    /// Frames held before pushes start waiting. Default: 5.
    pub capacity: usize,
    /// Longest a push waits for a free slot. Default: 50 ms.
    pub push_timeout: Duration,
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            capacity: 5,
            push_timeout: Duration::from_millis(50),
        }
    }
}

/// Why a frame never reached the consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// No slot freed up within the push timeout.
    QueueFull,
    /// The receiving side is gone or the inbox was closed.
    Closed,
}

/// Result of a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Delivery {
    Delivered,
    Dropped(DropReason),
}

impl Delivery {
    pub fn is_delivered(self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Why a pop returned without a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PopError {
    #[error("no frame arrived before the deadline")]
    Timeout,
    #[error("inbox closed")]
    Closed,
}

/// Push/drop counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InboxStats {
    pub delivered: u64,
    pub dropped_full: u64,
    pub dropped_closed: u64,
}

struct State {
    queue: VecDeque<Frame>,
    closed: bool,
    senders: usize,
    stats: InboxStats,
}

struct Shared {
    state: Mutex<State>,
    not_empty: Condvar,
    not_full: Condvar,
    config: InboxConfig,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking holder cannot leave a torn frame behind: frames are
        // pushed and popped whole.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn close(&self) {
        let mut state = self.lock();
        if !state.closed {
            trace!(queued = state.queue.len(), "inbox closed");
            state.closed = true;
        }
        drop(state);
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }
}

/// Create a bounded inbox.
///
/// The inbox closes when [`InboxCloser::close`] is called or every
/// [`InboxSender`] is dropped. Frames already queued stay poppable after
/// close.
pub fn inbox(config: InboxConfig) -> (InboxSender, InboxReceiver) {
    let capacity = config.capacity.max(1);
    let shared = Arc::new(Shared {
        state: Mutex::new(State {
            queue: VecDeque::with_capacity(capacity),
            closed: false,
            senders: 1,
            stats: InboxStats::default(),
        }),
        not_empty: Condvar::new(),
        not_full: Condvar::new(),
        config: InboxConfig { capacity, ..config },
    });
    (
        InboxSender {
            shared: Arc::clone(&shared),
        },
        InboxReceiver { shared },
    )
}

/// Delivery-context half.
pub struct InboxSender {
    shared: Arc<Shared>,
}

impl InboxSender {
    /// Queue `frame`, waiting at most the configured push timeout for space.
    pub fn push(&self, frame: Frame) -> Delivery {
        let shared = &*self.shared;
        let deadline = Instant::now() + shared.config.push_timeout;
        let mut state = shared.lock();

        loop {
            if state.closed {
                state.stats.dropped_closed += 1;
                warn!(len = frame.len(), "inbox closed; dropping frame");
                return Delivery::Dropped(DropReason::Closed);
            }
            if state.queue.len() < shared.config.capacity {
                state.queue.push_back(frame);
                state.stats.delivered += 1;
                drop(state);
                shared.not_empty.notify_one();
                return Delivery::Delivered;
            }

            let now = Instant::now();
            if now >= deadline {
                state.stats.dropped_full += 1;
                warn!(
                    len = frame.len(),
                    capacity = shared.config.capacity,
                    "inbox full; dropping frame"
                );
                return Delivery::Dropped(DropReason::QueueFull);
            }
            state = shared
                .not_full
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .0;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    pub fn closer(&self) -> InboxCloser {
        InboxCloser {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn stats(&self) -> InboxStats {
        self.shared.lock().stats
    }
}

impl Clone for InboxSender {
    fn clone(&self) -> Self {
        self.shared.lock().senders += 1;
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for InboxSender {
    fn drop(&mut self) {
        let last = {
            let mut state = self.shared.lock();
            state.senders -= 1;
            state.senders == 0
        };
        if last {
            self.shared.close();
        }
    }
}

impl std::fmt::Debug for InboxSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboxSender")
            .field("capacity", &self.shared.config.capacity)
            .finish()
    }
}

/// Test-context half.
pub struct InboxReceiver {
    shared: Arc<Shared>,
}

impl InboxReceiver {
    /// Wait up to `timeout` for the next frame.
    pub fn pop(&self, timeout: Duration) -> Result<Frame, PopError> {
        let shared = &*self.shared;
        let deadline = Instant::now() + timeout;
        let mut state = shared.lock();

        loop {
            if let Some(frame) = state.queue.pop_front() {
                drop(state);
                shared.not_full.notify_one();
                return Ok(frame);
            }
            if state.closed {
                return Err(PopError::Closed);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(PopError::Timeout);
            }
            state = shared
                .not_empty
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .0;
        }
    }

    /// Wait with no deadline. Only a close ends the wait without a frame.
    pub fn pop_blocking(&self) -> Result<Frame, PopError> {
        let shared = &*self.shared;
        let mut state = shared.lock();

        loop {
            if let Some(frame) = state.queue.pop_front() {
                drop(state);
                shared.not_full.notify_one();
                return Ok(frame);
            }
            if state.closed {
                return Err(PopError::Closed);
            }
            state = shared
                .not_empty
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Take a frame if one is already queued.
    pub fn try_pop(&self) -> Option<Frame> {
        let frame = self.shared.lock().queue.pop_front();
        if frame.is_some() {
            self.shared.not_full.notify_one();
        }
        frame
    }

    pub fn len(&self) -> usize {
        self.shared.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    pub fn closer(&self) -> InboxCloser {
        InboxCloser {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn stats(&self) -> InboxStats {
        self.shared.lock().stats
    }
}

impl Drop for InboxReceiver {
    fn drop(&mut self) {
        self.shared.close();
    }
}

impl std::fmt::Debug for InboxReceiver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboxReceiver")
            .field("queued", &self.len())
            .finish()
    }
}

/// Closes an inbox from any thread, waking a blocked consumer.
#[derive(Clone)]
pub struct InboxCloser {
    shared: Arc<Shared>,
}

impl InboxCloser {
    pub fn close(&self) {
        self.shared.close();
    }
}

impl std::fmt::Debug for InboxCloser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InboxCloser").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn small(capacity: usize) -> InboxConfig {
        InboxConfig {
            capacity,
            push_timeout: Duration::from_millis(20),
        }
    }

    #[test]
    fn fifo_order() {
        let (tx, rx) = inbox(InboxConfig::default());
        for payload in [&b"one"[..], b"two", b"three"] {
            assert_eq!(tx.push(Frame::new(payload.to_vec())), Delivery::Delivered);
        }

        assert!(rx.pop(Duration::ZERO).unwrap().is(b"one"));
        assert!(rx.pop(Duration::ZERO).unwrap().is(b"two"));
        assert!(rx.pop(Duration::ZERO).unwrap().is(b"three"));
    }

    #[test]
    fn full_inbox_drops_newest_after_timeout() {
        let (tx, rx) = inbox(small(2));
        assert!(tx.push(Frame::new(&b"a"[..])).is_delivered());
        assert!(tx.push(Frame::new(&b"b"[..])).is_delivered());

        let started = Instant::now();
        let outcome = tx.push(Frame::new(&b"c"[..]));
        assert_eq!(outcome, Delivery::Dropped(DropReason::QueueFull));
        assert!(started.elapsed() >= Duration::from_millis(20));

        assert!(rx.pop(Duration::ZERO).unwrap().is(b"a"));
        assert!(rx.pop(Duration::ZERO).unwrap().is(b"b"));
        assert_eq!(rx.pop(Duration::ZERO), Err(PopError::Timeout));
        assert_eq!(tx.stats().dropped_full, 1);
        assert_eq!(tx.stats().delivered, 2);
    }

    #[test]
    fn push_succeeds_when_consumer_frees_a_slot() {
        let (tx, rx) = inbox(InboxConfig {
            capacity: 1,
            push_timeout: Duration::from_secs(5),
        });
        assert!(tx.push(Frame::new(&b"first"[..])).is_delivered());

        let consumer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            let first = rx.pop(Duration::from_secs(1)).unwrap();
            let second = rx.pop(Duration::from_secs(1)).unwrap();
            (first, second)
        });

        assert!(tx.push(Frame::new(&b"second"[..])).is_delivered());
        let (first, second) = consumer.join().unwrap();
        assert!(first.is(b"first"));
        assert!(second.is(b"second"));
    }

    #[test]
    fn pop_times_out() {
        let (_tx, rx) = inbox(InboxConfig::default());
        let started = Instant::now();
        assert_eq!(rx.pop(Duration::from_millis(30)), Err(PopError::Timeout));
        assert!(started.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn pop_wakes_on_push_from_another_thread() {
        let (tx, rx) = inbox(InboxConfig::default());
        let producer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            tx.push(Frame::new(&b"ready"[..]))
        });

        let frame = rx.pop(Duration::from_secs(5)).unwrap();
        assert!(frame.is(b"ready"));
        assert!(producer.join().unwrap().is_delivered());
    }

    #[test]
    fn dropping_last_sender_closes_after_drain() {
        let (tx, rx) = inbox(InboxConfig::default());
        let clone = tx.clone();
        assert!(tx.push(Frame::new(&b"queued"[..])).is_delivered());
        drop(tx);
        assert!(!rx.is_closed());
        drop(clone);

        assert!(rx.is_closed());
        assert!(rx.pop_blocking().unwrap().is(b"queued"));
        assert_eq!(rx.pop_blocking(), Err(PopError::Closed));
    }

    #[test]
    fn closer_wakes_blocked_consumer() {
        let (_tx, rx) = inbox(InboxConfig::default());
        let closer = rx.closer();
        let waiter = thread::spawn(move || rx.pop_blocking());

        thread::sleep(Duration::from_millis(20));
        closer.close();
        assert_eq!(waiter.join().unwrap(), Err(PopError::Closed));
    }

    #[test]
    fn push_after_receiver_drop_is_dropped_closed() {
        let (tx, rx) = inbox(InboxConfig::default());
        drop(rx);
        assert_eq!(
            tx.push(Frame::new(&b"late"[..])),
            Delivery::Dropped(DropReason::Closed)
        );
        assert_eq!(tx.stats().dropped_closed, 1);
    }

    #[test]
    fn try_pop_and_len() {
        let (tx, rx) = inbox(InboxConfig::default());
        assert!(rx.try_pop().is_none());
        assert!(rx.is_empty());
        assert!(tx.push(Frame::new(&b"x"[..])).is_delivered());
        assert_eq!(rx.len(), 1);
        assert!(rx.try_pop().unwrap().is(b"x"));
    }

    #[test]
    fn zero_capacity_is_raised_to_one() {
        let (tx, rx) = inbox(small(0));
        assert!(tx.push(Frame::new(&b"only"[..])).is_delivered());
        assert!(rx.try_pop().is_some());
    }
}
