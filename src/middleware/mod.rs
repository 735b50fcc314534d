// src/middleware/mod.rs

//! Adapts suspendable bodies to the `(request, response, next)` middleware
//! calling convention.
//!
//! A *body* is an async function over an opaque request/response pair. The
//! [`Middleware`] wrapper lets a route dispatcher invoke it through the
//! conventional error-first callback protocol: the continuation is called
//! with no fault to continue the chain, with a fault displaying `route` to
//! skip the rest of the route, with any other fault to abort, or not called
//! at all when the body's final value says it handled everything itself.
//! The full mapping of final values lives in [`IntoDirective`].
//!
//! Synchronicity is dual-mode and exact: a body that never suspends runs to
//! completion, continuation included, inside [`call`](Middleware::call),
//! before it returns. A body that suspends hands its remainder to the
//! executor at the first suspension point; `call` returns immediately and
//! the continuation fires later. Callers that mutate shared state after
//! `call` must bring their own synchronization if the body might resume
//! concurrently with them; the adapter does not buffer that race.

use std::cell::Cell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures_util::task::{noop_waker_ref, LocalSpawn, LocalSpawnExt};
use tracing::trace;

use crate::error::{CallError, Fault};

mod directive;
mod progress;

pub use directive::{Directive, IntoDirective};
pub use progress::Progress;

/// The continuation handed to a middleware invocation by the route
/// dispatcher.
///
/// A `Next` is one-shot: it is either completed exactly once or dropped
/// uninvoked (the body's way of saying the dispatch chain ends here).
pub struct Next<E> {
  deliver: Box<dyn FnOnce(Option<Fault<E>>)>,
}

impl<E> Next<E> {
  /// Wraps a callback following the error-first convention: `None` means
  /// continue, `Some(fault)` aborts, and a fault for which
  /// [`is_route`](Fault::is_route) holds skips to the next route.
  pub fn new(deliver: impl FnOnce(Option<Fault<E>>) + 'static) -> Self {
    Self {
      deliver: Box::new(deliver),
    }
  }

  /// Invokes the underlying callback with the outcome.
  pub fn complete(self, fault: Option<Fault<E>>) {
    (self.deliver)(fault)
  }
}

impl<E> fmt::Debug for Next<E> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Next").finish_non_exhaustive()
  }
}

/// Wraps a suspendable body into a dispatcher-callable middleware.
///
/// The body receives the request, the response, and a [`Progress`] handle,
/// and resolves to `Result<T, E>` where `T`'s [`IntoDirective`] reading
/// decides what happens to the continuation. The executor driving suspended
/// bodies is supplied at construction through
/// [`LocalSpawn`](futures_util::task::LocalSpawn); the adapter itself never
/// suspends.
///
/// # Examples
///
/// ```
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// use baton::middleware::{Middleware, Next};
/// use futures_executor::LocalPool;
///
/// let pool = LocalPool::new();
/// let mw = Middleware::new(
///   |greeting: &'static str, _response: (), _progress| async move {
///     assert_eq!(greeting, "hello");
///     Ok::<_, std::convert::Infallible>("next")
///   },
///   pool.spawner(),
/// );
///
/// let fired = Rc::new(Cell::new(false));
/// let observer = fired.clone();
/// mw.call("hello", (), Some(Next::new(move |fault| {
///   assert!(fault.is_none());
///   observer.set(true);
/// })))
/// .unwrap();
///
/// // The body never suspended, so the continuation already ran.
/// assert!(fired.get());
/// ```
pub struct Middleware<B, S, V = ()> {
  body: B,
  spawner: S,
  observer: Option<Rc<dyn Fn(V)>>,
}

impl<B, S> Middleware<B, S> {
  /// Wraps `body`, using `spawner` to drive invocations that suspend.
  pub fn new(body: B, spawner: S) -> Self {
    Self {
      body,
      spawner,
      observer: None,
    }
  }
}

impl<B, S, V> Middleware<B, S, V> {
  /// Installs an observer for progress notifications and fixes the progress
  /// value type.
  ///
  /// Progress use still concludes the invocation as a failure; the observer
  /// exists so harnesses can watch the intermediate values out of band.
  pub fn observe_progress<W: 'static>(self, observer: impl Fn(W) + 'static) -> Middleware<B, S, W> {
    Middleware {
      body: self.body,
      spawner: self.spawner,
      observer: Some(Rc::new(observer)),
    }
  }

  /// Invokes the wrapped body with `request` and `response`, delivering the
  /// outcome through `next`.
  ///
  /// The continuation slot is validated before the body runs: an empty slot
  /// is a synchronous [`CallError::MissingContinuation`]. Every
  /// post-validation failure travels through the continuation instead; see
  /// [`Fault`].
  pub fn call<Req, Res, Fut, T, E>(
    &self,
    request: Req,
    response: Res,
    next: Option<Next<E>>,
  ) -> Result<(), CallError>
  where
    B: Fn(Req, Res, Progress<V>) -> Fut,
    Fut: Future<Output = Result<T, E>> + 'static,
    T: IntoDirective + 'static,
    E: 'static,
    S: LocalSpawn,
    V: 'static,
  {
    let next = next.ok_or(CallError::MissingContinuation)?;

    let poisoned = Rc::new(Cell::new(false));
    let progress = Progress::new(Rc::clone(&poisoned), self.observer.clone());
    let mut body = Box::pin((self.body)(request, response, progress));

    // Run to the first suspension point in the caller's context. Side
    // effects up to that point are visible before `call` returns.
    let mut cx = Context::from_waker(noop_waker_ref());
    match body.as_mut().poll(&mut cx) {
      Poll::Ready(verdict) => {
        conclude(next, poisoned.get(), verdict);
        Ok(())
      }
      Poll::Pending => {
        trace!("middleware body suspended, handing remainder to the executor");
        // The executor polls the remainder with its own waker; leaf futures
        // refresh their registered waker on that first re-poll.
        self.spawner.spawn_local(async move {
          let verdict = body.await;
          conclude(next, poisoned.get(), verdict);
        })?;
        Ok(())
      }
    }
  }
}

impl<B, S, V> fmt::Debug for Middleware<B, S, V> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Middleware")
      .field("observed", &self.observer.is_some())
      .finish_non_exhaustive()
  }
}

/// Applies the return-value protocol to a settled body.
fn conclude<T: IntoDirective, E>(next: Next<E>, poisoned: bool, verdict: Result<T, E>) {
  if poisoned {
    trace!("middleware concluded: progress was reported, failing the call");
    return next.complete(Some(Fault::ProgressDisallowed));
  }
  match verdict {
    Err(thrown) => next.complete(Some(Fault::Thrown(thrown))),
    Ok(value) => match value.into_directive() {
      // The continuation is dropped without being invoked.
      Directive::Stop => trace!("middleware concluded: stop"),
      Directive::Continue => next.complete(None),
      Directive::Route => next.complete(Some(Fault::Route)),
      Directive::Invalid(directive) => next.complete(Some(Fault::Invalid(directive))),
    },
  }
}
