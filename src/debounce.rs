use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

/// Coalesces bursts of calls into the last one, fired once input has been
/// quiet for `delay`.
///
/// Rescheduling before the delay elapses drops the pending call unrun. Once
/// the delay has elapsed the call runs on its own task and later schedules do
/// not cancel it.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    pending: Option<JoinHandle<()>>,
    in_flight: Arc<watch::Sender<usize>>,
}

/// Held by a fired call for as long as it runs.
struct InFlight(Arc<watch::Sender<usize>>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.send_modify(|n| *n = n.saturating_sub(1));
    }
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        let (in_flight, _) = watch::channel(0);
        Self {
            delay,
            pending: None,
            in_flight: Arc::new(in_flight),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&mut self, call: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.cancel() {
            debug!("Superseded pending debounced call");
        }
        let delay = self.delay;
        let in_flight = self.in_flight.clone();
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Counted before the spawn so there is no window where the call
            // is neither waiting nor in flight.
            in_flight.send_modify(|n| *n += 1);
            let guard = InFlight(in_flight);
            tokio::spawn(async move {
                let _guard = guard;
                call.await;
            });
        }));
    }

    /// True while a call is waiting out the delay or a fired call is still running.
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished()) || *self.in_flight.borrow() > 0
    }

    /// Waits for the waiting call to fire and for every fired call to finish.
    pub async fn idle(&mut self) {
        if let Some(handle) = self.pending.take() {
            let _ = handle.await;
        }
        let mut in_flight = self.in_flight.subscribe();
        let _ = in_flight.wait_for(|n| *n == 0).await;
    }

    /// Drops the pending call, if any. Returns whether one was still waiting.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test(start_paused = true)]
    async fn only_last_call_in_burst_runs() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut debouncer = Debouncer::new(Duration::from_millis(500));

        for term in ["h", "he", "hea", "heat"] {
            let calls = calls.clone();
            debouncer.schedule(async move {
                calls.lock().unwrap().push(term);
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(calls.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(*calls.lock().unwrap(), vec!["heat"]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_drops_pending_call() {
        let calls = Arc::new(Mutex::new(0));
        let mut debouncer = Debouncer::new(Duration::from_millis(500));
        let c = calls.clone();
        debouncer.schedule(async move {
            *c.lock().unwrap() += 1;
        });
        assert!(debouncer.cancel());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(*calls.lock().unwrap(), 0);
        assert!(!debouncer.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn fired_call_stays_pending_until_it_finishes() {
        let done = Arc::new(Mutex::new(false));
        let mut debouncer = Debouncer::new(Duration::from_millis(500));
        let d = done.clone();
        debouncer.schedule(async move {
            tokio::time::sleep(Duration::from_secs(2)).await;
            *d.lock().unwrap() = true;
        });

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(debouncer.is_pending());
        assert!(!debouncer.cancel());
        assert!(debouncer.is_pending());

        debouncer.idle().await;
        assert!(*done.lock().unwrap());
        assert!(!debouncer.is_pending());
    }
}
