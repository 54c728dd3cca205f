//! # rxflow: push-based reactive dataflow
//!
//! Lazy streams and properties wired into a graph that switches itself on
//! when somebody listens and off again when the last listener leaves.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::{cell::RefCell, rc::Rc};
//!
//! use rxflow::prelude::*;
//!
//! let clicks = Bus::<u32>::new();
//! let count = clicks.scan(0, |n, _| n + 1);
//!
//! let seen = Rc::new(RefCell::new(vec![]));
//! let c_seen = seen.clone();
//! count.on_value(move |n| c_seen.borrow_mut().push(n));
//!
//! clicks.push(1).push(1);
//! assert_eq!(*seen.borrow(), vec![0, 1, 2]);
//! assert_eq!(count.value(), Some(2));
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Stream`] | Delivers values as they happen |
//! | [`Property`] | Also remembers its latest value and replays it to new listeners |
//! | [`Bus`] | A stream you push into by hand |
//! | [`Observable`] | The operators shared by all of the above |
//! | [`Scheduler`] | Timer service behind `throttle`, `delay` and the generators |
//!
//! Every node has four channels: `value`, `error`, `both` and `end`. Listening
//! on any of the first three activates the node, which in turn activates
//! whatever it reads from. Listening on `end` alone does not. Errors are plain
//! signals and never end a node; `end` does, permanently.
//!
//! ## Feature Flags
//!
//! - **`tokio-scheduler`** (default): [`LocalScheduler`], a [`Scheduler`] on
//!   tokio timers.
//!
//! [`Stream`]: observable::Stream
//! [`Property`]: observable::Property
//! [`Bus`]: bus::Bus
//! [`Observable`]: observable::Observable
//! [`Scheduler`]: scheduler::Scheduler
//! [`LocalScheduler`]: scheduler::LocalScheduler

pub mod arena;
pub mod binding;
pub mod bus;
pub mod error;
pub mod log;
pub mod node;
pub mod observable;
pub mod ops;
pub mod pluggable;
pub mod prelude;
pub mod scheduler;
pub mod signal;
pub mod subscribers;

pub use error::{Error, Result};
pub use observable::{combine, combine_with, merge, on_values};

#[cfg(doctest)]
mod __markdown_doctests {
  mod readme {
    #![doc = include_str!("../README.md")]
  }
}
