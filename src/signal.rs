//! Signal types flowing through the graph.
//!
//! A node delivers exactly three kinds of signals: values, errors and the
//! terminal end marker. Listeners on the `both` channel receive an [`Event`],
//! which is a signal without the end case.

use std::fmt::{Display, Formatter};

/// The tagged payload of a single emission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Signal<T, E> {
  Value(T),
  Error(E),
  End,
}

impl<T, E> Signal<T, E> {
  #[inline]
  pub fn is_end(&self) -> bool { matches!(self, Signal::End) }

  /// Returns the channel this signal is dispatched on.
  pub fn channel(&self) -> Channel {
    match self {
      Signal::Value(_) => Channel::Value,
      Signal::Error(_) => Channel::Error,
      Signal::End => Channel::End,
    }
  }
}

/// Payload of the `both` channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event<T, E> {
  Value(T),
  Error(E),
}

impl<T, E> From<Event<T, E>> for Signal<T, E> {
  fn from(event: Event<T, E>) -> Self {
    match event {
      Event::Value(v) => Signal::Value(v),
      Event::Error(e) => Signal::Error(e),
    }
  }
}

/// Reply of a listener after it handled a signal.
///
/// Returning [`Flow::StopListening`] removes the listener from the channel it
/// was invoked on, right after the invocation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Flow {
  #[default]
  Continue,
  StopListening,
}

impl From<()> for Flow {
  #[inline]
  fn from(_: ()) -> Self { Flow::Continue }
}

impl From<bool> for Flow {
  /// `true` keeps listening, `false` stops.
  #[inline]
  fn from(more: bool) -> Self { if more { Flow::Continue } else { Flow::StopListening } }
}

/// The four subscriber channels of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
  Value,
  Error,
  Both,
  End,
}

impl Channel {
  /// `end` listeners observe termination without activating the node.
  #[inline]
  pub fn activates(self) -> bool { self != Channel::End }

  pub fn label(self) -> &'static str {
    match self {
      Channel::Value => "<value>",
      Channel::Error => "<error>",
      Channel::Both => "<both>",
      Channel::End => "<end>",
    }
  }
}

impl Display for Channel {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.label()) }
}
