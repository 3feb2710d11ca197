//! Cancellable deferred and recurring events.

use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::runtime::{Handle, TryCurrentError};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, instrument, trace};

/// Owns spawned timer tasks that post events back to their owner.
///
/// Every event carries the epoch it was scheduled in. [`cancel_all`]
/// aborts the tasks and advances the epoch, so an event already in flight
/// from a superseded play-through is dropped instead of delivered.
///
/// Scheduling spawns onto the current tokio runtime and fails with
/// [`TryCurrentError`] when called outside one.
///
/// [`cancel_all`]: Scheduler::cancel_all
pub struct Scheduler<E> {
    tx: mpsc::UnboundedSender<(u64, E)>,
    rx: mpsc::UnboundedReceiver<(u64, E)>,
    epoch: u64,
    tasks: Vec<AbortHandle>,
}

impl<E> Scheduler<E> {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            epoch: 0,
            tasks: Vec::new(),
        }
    }

    /// Aborts every task and discards undelivered events.
    #[instrument(skip(self), fields(epoch = self.epoch, tasks = self.tasks.len()))]
    pub fn cancel_all(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.epoch += 1;
        while self.rx.try_recv().is_ok() {}
        debug!(epoch = self.epoch, "Scheduled tasks cancelled");
    }

    /// Number of tasks still running.
    pub fn pending(&self) -> usize {
        self.tasks.iter().filter(|t| !t.is_finished()).count()
    }

    fn track(&mut self, handle: AbortHandle) {
        self.tasks.retain(|t| !t.is_finished());
        self.tasks.push(handle);
    }
}

impl<E> Scheduler<E>
where
    E: Clone + Send + fmt::Debug + 'static,
{
    /// Delivers `event` once after `delay`.
    #[instrument(skip(self))]
    pub fn after(&mut self, delay: Duration, event: E) -> Result<(), TryCurrentError> {
        let runtime = Handle::try_current()?;
        let tx = self.tx.clone();
        let epoch = self.epoch;
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            trace!(?event, epoch, "Deferred event fired");
            let _ = tx.send((epoch, event));
        });
        self.track(handle.abort_handle());
        Ok(())
    }

    /// Delivers `event` every `period`, first after one full period.
    #[instrument(skip(self))]
    pub fn every(&mut self, period: Duration, event: E) -> Result<(), TryCurrentError> {
        let runtime = Handle::try_current()?;
        let tx = self.tx.clone();
        let epoch = self.epoch;
        let handle = runtime.spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if tx.send((epoch, event.clone())).is_err() {
                    break;
                }
            }
        });
        self.track(handle.abort_handle());
        Ok(())
    }

    /// Delivers the output of `work` once it resolves.
    ///
    /// The task is detached: [`cancel_all`] does not abort it, so the work
    /// always runs to completion, but its event is dropped if the epoch moved
    /// on in the meantime.
    ///
    /// [`cancel_all`]: Scheduler::cancel_all
    #[instrument(skip(self, work))]
    pub fn when_done<F>(&mut self, work: F) -> Result<(), TryCurrentError>
    where
        F: Future<Output = E> + Send + 'static,
    {
        let runtime = Handle::try_current()?;
        let tx = self.tx.clone();
        let epoch = self.epoch;
        runtime.spawn(async move {
            let event = work.await;
            trace!(?event, epoch, "Background work finished");
            let _ = tx.send((epoch, event));
        });
        Ok(())
    }

    /// Waits for the next event of the current epoch.
    ///
    /// Pends forever when nothing is scheduled, which suits a `select!` loop.
    pub async fn next(&mut self) -> E {
        loop {
            match self.rx.recv().await {
                Some((epoch, event)) if epoch == self.epoch => return event,
                Some((epoch, event)) => {
                    trace!(?event, epoch, current = self.epoch, "Dropping stale event");
                }
                None => std::future::pending::<()>().await,
            }
        }
    }
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Scheduler<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("epoch", &self.epoch)
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

impl<E> Drop for Scheduler<E> {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}
