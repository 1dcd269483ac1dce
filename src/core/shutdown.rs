//! One-shot shutdown broadcast
//!
//! The signal is a channel nobody ever sends on. Firing it drops the only
//! [`Sender`], and every [`ShutdownListener`] blocked in a `select!` on the
//! matching receiver wakes up at once with a disconnection. Listeners that
//! arrive later observe the same disconnection immediately.

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// The writing side of the broadcast, owned by the pool
#[derive(Debug)]
pub struct ShutdownSignal {
    fired: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
    listener: Receiver<()>,
}

impl ShutdownSignal {
    /// Create a signal in the open state
    pub fn new() -> Self {
        let (trigger, listener) = bounded(0);
        Self {
            fired: AtomicBool::new(false),
            trigger: Mutex::new(Some(trigger)),
            listener,
        }
    }

    /// Fire the signal.
    ///
    /// Returns `false` if it had already been fired; the transition happens
    /// exactly once.
    pub fn fire(&self) -> bool {
        if self
            .fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }
        drop(self.trigger.lock().take());
        true
    }

    /// Returns true once [`fire`](Self::fire) has been called
    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// A new listener for this signal
    pub fn listener(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.listener.clone(),
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// The reading side of the broadcast
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    rx: Receiver<()>,
}

impl ShutdownListener {
    /// Receiver that becomes ready (disconnected) when the signal fires.
    /// Meant to be used as one arm of a `select!`.
    pub fn receiver(&self) -> &Receiver<()> {
        &self.rx
    }

    /// Non-blocking check
    pub fn is_fired(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::select;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_fire_once() {
        let signal = ShutdownSignal::new();
        assert!(!signal.is_fired());
        assert!(signal.fire());
        assert!(signal.is_fired());
        assert!(!signal.fire());
    }

    #[test]
    fn test_listeners_observe_fire() {
        let signal = ShutdownSignal::new();
        let early = signal.listener();
        assert!(!early.is_fired());

        signal.fire();
        assert!(early.is_fired());
        assert!(signal.listener().is_fired());
    }

    #[test]
    fn test_fire_wakes_every_blocked_listener() {
        let signal = ShutdownSignal::new();
        let (never_tx, never_rx) = bounded::<()>(0);

        let waiters: Vec<_> = (0..4)
            .map(|_| {
                let listener = signal.listener();
                let never_rx = never_rx.clone();
                thread::spawn(move || {
                    select! {
                        recv(never_rx) -> _ => false,
                        recv(listener.receiver()) -> _ => true,
                    }
                })
            })
            .collect();

        thread::sleep(Duration::from_millis(20));
        signal.fire();

        for waiter in waiters {
            assert!(waiter.join().unwrap());
        }
        drop(never_tx);
    }
}
