use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded};

/// One-shot broadcast cancellation token.
///
/// Cloned tokens share the same trigger: once any clone calls
/// [`CancelToken::cancel`], every waiter unblocks and every later check
/// reports cancelled. There is no way to "un-cancel".
#[derive(Clone)]
pub struct CancelToken {
    trigger: Arc<Mutex<Option<Sender<()>>>>,
    done: Receiver<()>,
}

impl CancelToken {
    pub fn new() -> Self {
        // Zero-capacity channel, never sent on. Dropping the sole sender
        // disconnects every cloned receiver at once.
        let (trigger, done) = bounded::<()>(0);
        Self {
            trigger: Arc::new(Mutex::new(Some(trigger))),
            done,
        }
    }

    /// Fires the token. Idempotent.
    pub fn cancel(&self) {
        self.trigger.lock().unwrap().take();
    }

    /// Non-blocking check whether the token has fired.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.done.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Blocks the calling thread until the token fires.
    pub fn wait(&self) {
        let _ = self.done.recv();
    }

    /// A receiver that becomes ready (disconnected) when the token fires,
    /// for use in `select!` loops.
    pub fn done(&self) -> Receiver<()> {
        self.done.clone()
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn starts_unfired() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn cancel_is_idempotent() {
        let token = CancelToken::new();
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn cancel_wakes_every_waiter() {
        let token = CancelToken::new();
        let handles: Vec<_> = (0..3)
            .map(|_| {
                let waiter = token.clone();
                std::thread::spawn(move || {
                    waiter.wait();
                    waiter.is_cancelled()
                })
            })
            .collect();
        std::thread::sleep(Duration::from_millis(10));
        token.cancel();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }

    #[test]
    fn clones_observe_cancellation() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
        assert!(clone.is_cancelled());
    }
}
