// src/error.rs

use core::fmt;

use futures_util::task::SpawnError;
use thiserror::Error;

/// Error returned synchronously by [`Middleware::call`](crate::Middleware::call)
/// before the wrapped body has started.
///
/// Everything that happens after validation is reported through the
/// continuation instead; see [`Fault`].
#[derive(Debug, Error)]
pub enum CallError {
  /// The continuation slot was empty. Routing layers assembled from dynamic
  /// tables can mis-wire a tail position; the mistake surfaces at call time
  /// rather than as a silently dropped outcome.
  #[error("middleware invoked without a continuation callback")]
  MissingContinuation,
  /// The executor refused the suspended remainder of the body, which happens
  /// when it is shutting down.
  #[error("executor rejected the suspended middleware body: {0}")]
  Spawn(#[from] SpawnError),
}

/// Failure delivered through the continuation when a middleware invocation
/// does not conclude with plain "continue" or "stop".
///
/// `E` is the body's own error type and is intentionally unconstrained: a
/// body may fail with any value, and that value travels by move, unwrapped
/// and unmodified, inside [`Fault::Thrown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault<E> {
  /// The body asked the dispatcher to skip to the next route. Displays as
  /// exactly `route`, the token route dispatchers match on.
  Route,
  /// The body produced a directive outside the protocol; carries the
  /// offending value's rendering.
  Invalid(String),
  /// The body reported intermediate progress, which the middleware protocol
  /// does not admit.
  ProgressDisallowed,
  /// The body failed with its own error value.
  Thrown(E),
}

impl<E> Fault<E> {
  /// Whether this fault is the route-skip signal.
  pub fn is_route(&self) -> bool {
    matches!(self, Fault::Route)
  }

  /// Consumes the fault, returning the body's own error value if there is one.
  pub fn into_thrown(self) -> Option<E> {
    match self {
      Fault::Thrown(e) => Some(e),
      _ => None,
    }
  }
}

impl<E: fmt::Display> fmt::Display for Fault<E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Fault::Route => f.write_str("route"),
      Fault::Invalid(directive) => write!(f, "invalid middleware directive: {directive}"),
      Fault::ProgressDisallowed => f.write_str("progress reporting is disallowed in middleware"),
      Fault::Thrown(e) => fmt::Display::fmt(e, f),
    }
  }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for Fault<E> {}
