//! A non-blocking counting gate for admission control.
//!
//! The `CountingGate` limits how many units of work are active at once.
//! Callers hand `enter` a zero-argument action: if a slot is free the action
//! runs synchronously, in the calling context, before `enter` returns;
//! otherwise the action is queued and runs later, synchronously within the
//! `leave` call that frees a slot.
//!
//! The gate never blocks and never locks. Its state lives behind a `RefCell`,
//! so a gate instance belongs to one logical thread; clones of a gate share
//! that state. Hosts running several logical threads give each its own gate.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

type Admission = Box<dyn FnOnce()>;

/// The interior of the gate, shared by all clones of a handle.
struct GateInternal {
  /// Unused admission slots.
  available: usize,
  /// Actions denied immediate admission. `leave` releases from the back.
  waiters: Vec<Admission>,
}

/// A clonable handle to a counting admission gate.
///
/// Release order is **last-in, first-out**: `leave` hands the freed slot to
/// the most recently queued action. Under sustained contention the earliest
/// waiters can therefore starve. If fair (FIFO) release is required, remove
/// waiters from the front of the queue instead; that is an integration-time
/// decision, not a configuration switch.
///
/// # Examples
///
/// ```
/// use baton::CountingGate;
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let gate = CountingGate::new(1);
/// let order = Rc::new(RefCell::new(Vec::new()));
///
/// for name in ["a", "b", "c"] {
///   let order = order.clone();
///   gate.enter(move || order.borrow_mut().push(name));
/// }
/// // One slot: only the first action has run, the rest are queued.
/// assert_eq!(*order.borrow(), ["a"]);
///
/// gate.leave();
/// // The most recently queued action inherits the slot.
/// assert_eq!(*order.borrow(), ["a", "c"]);
/// ```
pub struct CountingGate {
  capacity: usize,
  internal: Rc<RefCell<GateInternal>>,
}

impl CountingGate {
  /// Creates a gate with `capacity` admission slots, all initially free.
  pub fn new(capacity: usize) -> Self {
    Self {
      capacity,
      internal: Rc::new(RefCell::new(GateInternal {
        available: capacity,
        waiters: Vec::new(),
      })),
    }
  }

  /// Returns the total capacity of the gate.
  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Returns the number of currently free admission slots.
  pub fn available(&self) -> usize {
    self.internal.borrow().available
  }

  /// Returns the number of queued actions awaiting admission.
  pub fn waiting(&self) -> usize {
    self.internal.borrow().waiters.len()
  }

  /// Requests admission for `action`.
  ///
  /// With a slot free, `action` runs synchronously before `enter` returns.
  /// Otherwise it is queued; it will run synchronously inside a future
  /// [`leave`](CountingGate::leave). A queued action cannot be withdrawn and
  /// waits indefinitely. Panics inside `action` are not caught; they
  /// propagate out of whichever call triggered the action.
  pub fn enter<F: FnOnce() + 'static>(&self, action: F) {
    let mut internal = self.internal.borrow_mut();
    if internal.available > 0 {
      internal.available -= 1;
      trace!(available = internal.available, "gate admission granted");
      // Release the borrow first: the action may reenter this gate.
      drop(internal);
      action();
    } else {
      internal.waiters.push(Box::new(action));
      trace!(waiting = internal.waiters.len(), "gate admission queued");
    }
  }

  /// Returns one admission slot, previously obtained via a matching
  /// [`enter`](CountingGate::enter).
  ///
  /// If actions are queued, the most recently queued one runs synchronously
  /// within this call and inherits the slot directly; `available` is left
  /// untouched. With an empty queue the slot is returned to the pool.
  pub fn leave(&self) {
    let mut internal = self.internal.borrow_mut();
    match internal.waiters.pop() {
      Some(action) => {
        trace!(waiting = internal.waiters.len(), "gate slot inherited by last waiter");
        drop(internal);
        action();
      }
      None => {
        debug_assert!(
          internal.available < self.capacity,
          "leave() without a matching enter()"
        );
        internal.available += 1;
        trace!(available = internal.available, "gate slot returned");
      }
    }
  }
}

impl Clone for CountingGate {
  fn clone(&self) -> Self {
    Self {
      capacity: self.capacity,
      internal: self.internal.clone(),
    }
  }
}

impl fmt::Debug for CountingGate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let internal = self.internal.borrow();
    f.debug_struct("CountingGate")
      .field("capacity", &self.capacity)
      .field("available", &internal.available)
      .field("waiting", &internal.waiters.len())
      .finish()
  }
}
