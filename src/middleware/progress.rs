//! The progress-reporting capability handed to middleware bodies.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// A per-invocation handle through which a suspendable body could report
/// intermediate values before completing.
///
/// Middleware bodies receive one whether they want it or not, but the
/// dispatcher calling convention has no channel for intermediate values:
/// any call to [`report`](Progress::report) poisons the invocation, and the
/// operation concludes with
/// [`Fault::ProgressDisallowed`](crate::Fault::ProgressDisallowed) no matter
/// what the body eventually returns.
///
/// Reported values are forwarded to the adapter's observer (see
/// [`Middleware::observe_progress`](crate::Middleware::observe_progress)) so
/// an external harness can watch them; they are never delivered through the
/// continuation.
pub struct Progress<V> {
  poisoned: Rc<Cell<bool>>,
  sink: Option<Rc<dyn Fn(V)>>,
}

impl<V> Progress<V> {
  pub(crate) fn new(poisoned: Rc<Cell<bool>>, sink: Option<Rc<dyn Fn(V)>>) -> Self {
    Self { poisoned, sink }
  }

  /// Reports an intermediate value, poisoning the surrounding invocation.
  pub fn report(&self, value: V) {
    self.poisoned.set(true);
    match &self.sink {
      Some(sink) => sink(value),
      None => drop(value),
    }
  }
}

impl<V> Clone for Progress<V> {
  fn clone(&self) -> Self {
    Self {
      poisoned: self.poisoned.clone(),
      sink: self.sink.clone(),
    }
  }
}

impl<V> fmt::Debug for Progress<V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Progress")
      .field("poisoned", &self.poisoned.get())
      .field("observed", &self.sink.is_some())
      .finish()
  }
}
