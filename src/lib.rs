//! Building blocks for adapting suspendable (coroutine-style) work to the
//! classic `(request, response, next)` middleware calling convention, plus a
//! counting admission gate that bounds how many such operations are active
//! at once.
//!
//! Everything here targets cooperative, single-threaded scheduling: state is
//! `Rc`/`RefCell`-shared, the types are deliberately not `Send`, and the
//! external executor is reached through [`futures_util::task::LocalSpawn`].
//! The two components are independent; a [`CountingGate`] is typically used
//! to bound concurrent [`Middleware`] invocations.

pub mod coord;
pub mod error;
pub mod middleware;

// Public re-exports for convenience.
pub use coord::CountingGate;
pub use error::{CallError, Fault};
pub use middleware::{Directive, IntoDirective, Middleware, Next, Progress};
