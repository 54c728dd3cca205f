//! Errors returned by the library API.
//!
//! These are distinct from the error *signals* a stream carries: a stream's
//! errors travel through the graph as `Signal::Error(E)`.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Error {
  /// Read the value of a property that has none yet.
  #[error("{node} has no current value")]
  NoValue { node: String },

  /// Emitted through a node that already ended.
  #[error("{node} has already ended")]
  Ended { node: String },
}
