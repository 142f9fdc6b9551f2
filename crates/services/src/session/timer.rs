use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;

/// A cancellable task that runs a callback once per `period`.
///
/// The first call happens one full period after spawning. Cancelling is
/// idempotent and also happens on drop. A callback already in progress runs
/// to completion; no further calls are made after cancellation is observed.
#[derive(Debug)]
pub(crate) struct PeriodicTask {
    token: CancellationToken,
}

impl PeriodicTask {
    /// Spawn on the current tokio runtime, stopping when `parent` is cancelled.
    pub(crate) fn spawn<F, Fut>(
        parent: &CancellationToken,
        period: Duration,
        mut callback: F,
    ) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        let token = parent.child_token();
        let stop = token.clone();
        let mut ticks = interval_at(Instant::now() + period, period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    () = stop.cancelled() => break,
                    _ = ticks.tick() => {
                        if callback().await.is_break() {
                            break;
                        }
                    }
                }
            }
        });

        Self { token }
    }

    pub(crate) fn cancel(&self) {
        self.token.cancel();
    }

    pub(crate) fn is_running(&self) -> bool {
        !self.token.is_cancelled()
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Run `action` after `delay` unless `token` is cancelled first.
pub(crate) fn spawn_delayed<Fut>(token: CancellationToken, delay: Duration, action: Fut)
where
    Fut: Future<Output = ()> + Send + 'static,
{
    let sleep = tokio::time::sleep(delay);
    tokio::spawn(async move {
        tokio::select! {
            biased;
            () = token.cancelled() => {}
            () = sleep => action.await,
        }
    });
}
