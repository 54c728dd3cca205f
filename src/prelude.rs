//! Prelude module for convenient imports.

// Scheduler-specific
#[cfg(feature = "tokio-scheduler")]
pub use crate::scheduler::LocalScheduler;
pub use crate::{
  binding::{Binding, Listener},
  bus::Bus,
  error::Error,
  node::{Kind, Lifecycle, NodeRef},
  observable::{
    combine, combine_with,
    interval::{from_poll, interval, later, repeatedly, sequentially, ticks},
    merge, on_values, Emitter, Observable, Property, Stream,
  },
  ops::{throttle::ThrottleOptions, Operator},
  scheduler::{Scheduler, TaskHandle, TestScheduler},
  signal::{Channel, Event, Flow, Signal},
};
