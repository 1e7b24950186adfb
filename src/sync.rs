//! Completion signalling between interrupts and the render task
//!
//! Interrupt handlers never touch display state. They only give a [`Signal`]
//! through a [`Notifier`]; the render task takes it. Ownership of a buffer
//! passes to the transport when it is handed to the panel and comes back when
//! the signal is taken.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use lcd_port::sync::{Notifier, Signal};
//! # use embedded_hal::delay::DelayNs;
//! # struct MockDelay;
//! # impl DelayNs for MockDelay { fn delay_ns(&mut self, _ns: u32) {} }
//!
//! let done = Arc::new(Signal::new());
//! let notifier = Notifier::new(done.clone());
//!
//! // From the interrupt handler
//! notifier.notify();
//!
//! // From the render task
//! done.wait(&mut MockDelay);
//! assert!(!done.is_set());
//! ```

use alloc::sync::Arc;
use core::fmt;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal;
use embedded_hal::delay::DelayNs;

/// Poll interval used while blocked on a signal, in microseconds
pub const WAIT_POLL_INTERVAL_US: u32 = 50;

/// Binary semaphore
///
/// `give` and `try_take` never block and are safe to call from interrupt
/// context. Giving an already given signal keeps a single pending count.
///
/// Guarded by a critical section, so the target must provide a
/// `critical-section` implementation.
pub struct Signal {
    inner: signal::Signal<CriticalSectionRawMutex, ()>,
}

impl Signal {
    /// Create an empty signal
    pub const fn new() -> Self {
        Self {
            inner: signal::Signal::new(),
        }
    }

    /// Give the signal
    ///
    /// Returns `true` if the signal was empty before.
    pub fn give(&self) -> bool {
        let was_empty = !self.inner.signaled();
        self.inner.signal(());
        was_empty
    }

    /// Take the signal if it is pending
    pub fn try_take(&self) -> bool {
        self.inner.try_take().is_some()
    }

    /// Drop a pending give
    pub fn clear(&self) {
        self.inner.reset();
    }

    /// Whether a give is pending, without taking it
    pub fn is_set(&self) -> bool {
        self.inner.signaled()
    }

    /// Block until the signal is given, then take it
    ///
    /// There is no timeout: an unresponsive transport stalls the caller.
    pub fn wait<D: DelayNs>(&self, delay: &mut D) {
        while !self.try_take() {
            core::hint::spin_loop();
            delay.delay_us(WAIT_POLL_INTERVAL_US);
        }
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("pending", &self.is_set())
            .finish()
    }
}

/// Interrupt-safe handle giving a display-owned signal
///
/// Handed to transports and accelerators when their completion callbacks are
/// registered. Optionally also wakes the render task.
#[derive(Clone, Debug)]
pub struct Notifier {
    target: Arc<Signal>,
    wake: Option<Arc<Signal>>,
}

impl Notifier {
    /// Notifier giving `target`
    pub fn new(target: Arc<Signal>) -> Self {
        Self { target, wake: None }
    }

    /// Also give `wake` on every notification
    pub fn with_wake(mut self, wake: Arc<Signal>) -> Self {
        self.wake = Some(wake);
        self
    }

    /// Signal completion
    ///
    /// Never blocks. Returns `true` if the target signal was empty, meaning a
    /// waiter may now run and the interrupt should request a yield.
    pub fn notify(&self) -> bool {
        let woke = self.target.give();
        if let Some(wake) = &self.wake {
            wake.give();
        }
        woke
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    extern crate std;

    struct MockDelay;
    impl DelayNs for MockDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    #[test]
    fn test_signal_is_binary() {
        let signal = Signal::new();
        assert!(signal.give());
        assert!(!signal.give());
        assert!(signal.try_take());
        assert!(!signal.try_take());
    }

    #[test]
    fn test_clear_drops_pending_give() {
        let signal = Signal::new();
        signal.give();
        signal.clear();
        assert!(!signal.is_set());
        assert!(!signal.try_take());
    }

    #[test]
    fn test_wait_returns_when_already_given() {
        let signal = Signal::new();
        signal.give();
        signal.wait(&mut MockDelay);
        assert!(!signal.is_set());
    }

    #[test]
    fn test_notifier_wakes_render_task() {
        let done = Arc::new(Signal::new());
        let wake = Arc::new(Signal::new());
        let notifier = Notifier::new(done.clone()).with_wake(wake.clone());

        assert!(notifier.notify());
        assert!(done.is_set());
        assert!(wake.is_set());
        assert!(!notifier.notify());
    }

    #[test]
    fn test_wait_blocks_until_other_thread_notifies() {
        use core::sync::atomic::{AtomicBool, Ordering};
        use std::thread;
        use std::time::Duration;

        let done = Arc::new(Signal::new());
        let fired = Arc::new(AtomicBool::new(false));
        let notifier = Notifier::new(done.clone());

        let handle = {
            let fired = fired.clone();
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                fired.store(true, Ordering::SeqCst);
                notifier.notify();
            })
        };

        done.wait(&mut MockDelay);
        assert!(fired.load(Ordering::SeqCst));
        handle.join().unwrap();
    }
}
