//! A [`Scheduler`] backed by tokio timers.
//!
//! Tasks are spawned with [`tokio::task::spawn_local`], so every call must
//! happen inside a [`tokio::task::LocalSet`] on a current-thread runtime.

use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};

use super::{Scheduler, TaskHandle};

thread_local! {
  static ORIGIN: Instant = Instant::now();
}

/// Runs timers on the current tokio `LocalSet`.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalScheduler;

impl Scheduler for LocalScheduler {
  fn now(&self) -> Duration { ORIGIN.with(|origin| origin.elapsed()) }

  fn schedule_after(&self, delay: Duration, task: impl FnOnce() + 'static) -> TaskHandle {
    let handle = TaskHandle::new();
    let guard = handle.clone();
    tokio::task::spawn_local(async move {
      time::sleep(delay).await;
      if !guard.is_closed() {
        guard.cancel();
        task();
      }
    });
    handle
  }

  fn schedule_periodic(&self, period: Duration, mut task: impl FnMut() + 'static) -> TaskHandle {
    // tokio rejects a zero period.
    let period = period.max(Duration::from_millis(1));
    let handle = TaskHandle::new();
    let guard = handle.clone();
    tokio::task::spawn_local(async move {
      let mut ticker = time::interval_at(Instant::now() + period, period);
      ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
      loop {
        ticker.tick().await;
        if guard.is_closed() {
          break;
        }
        task();
      }
    });
    handle
  }
}
