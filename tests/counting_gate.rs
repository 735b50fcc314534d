use std::cell::{Cell, RefCell};
use std::rc::Rc;

use baton::CountingGate;

#[test]
fn admits_up_to_capacity_synchronously() {
  let gate = CountingGate::new(3);
  let admitted = Rc::new(Cell::new(0));

  for _ in 0..3 {
    let admitted = admitted.clone();
    gate.enter(move || admitted.set(admitted.get() + 1));
  }
  assert_eq!(admitted.get(), 3);
  assert_eq!(gate.available(), 0);

  // The fourth request must wait for a leave.
  let over = admitted.clone();
  gate.enter(move || over.set(over.get() + 1));
  assert_eq!(admitted.get(), 3);
  assert_eq!(gate.waiting(), 1);

  gate.leave();
  assert_eq!(admitted.get(), 4);
  assert_eq!(gate.waiting(), 0);
}

#[test]
fn releases_the_most_recent_waiter_first() {
  let gate = CountingGate::new(1);
  let order = Rc::new(RefCell::new(Vec::new()));

  for name in ["a", "b", "c"] {
    let order = order.clone();
    gate.enter(move || order.borrow_mut().push(name));
  }
  assert_eq!(*order.borrow(), ["a"]);

  gate.leave();
  assert_eq!(*order.borrow(), ["a", "c"]);

  gate.leave();
  assert_eq!(*order.borrow(), ["a", "c", "b"]);
}

#[test]
fn waiter_inherits_the_slot_without_freeing_it() {
  let gate = CountingGate::new(1);
  gate.enter(|| {});
  gate.enter(|| {});
  assert_eq!(gate.waiting(), 1);

  // The queued action runs inside this leave and keeps the slot.
  gate.leave();
  assert_eq!(gate.available(), 0);

  gate.leave();
  assert_eq!(gate.available(), 1);
}

#[test]
fn balanced_cycles_restore_capacity() {
  let gate = CountingGate::new(2);
  for _ in 0..5 {
    gate.enter(|| {});
    gate.enter(|| {});
    gate.leave();
    gate.leave();
  }
  assert_eq!(gate.available(), 2);
  assert_eq!(gate.waiting(), 0);
}

#[test]
fn queued_actions_may_reenter_the_gate() {
  let gate = CountingGate::new(1);
  let log = Rc::new(RefCell::new(Vec::new()));

  {
    let log = log.clone();
    gate.enter(move || log.borrow_mut().push("held"));
  }

  for name in ["queued-1", "queued-2"] {
    let log = log.clone();
    let gate = gate.clone();
    // hold the slot only for the duration of the action itself
    gate.clone().enter(move || {
      log.borrow_mut().push(name);
      gate.leave();
    });
  }
  assert_eq!(*log.borrow(), ["held"]);
  assert_eq!(gate.waiting(), 2);

  // Admits queued-2, whose own leave admits queued-1, whose leave finally
  // returns the slot.
  gate.leave();
  assert_eq!(*log.borrow(), ["held", "queued-2", "queued-1"]);
  assert_eq!(gate.available(), 1);
  assert_eq!(gate.waiting(), 0);
}

#[test]
fn independent_instances_do_not_interact() {
  let a = CountingGate::new(1);
  let b = CountingGate::new(1);

  a.enter(|| {});
  assert_eq!(a.available(), 0);
  assert_eq!(b.available(), 1);

  b.enter(|| {});
  b.leave();
  assert_eq!(a.available(), 0);
  assert_eq!(b.available(), 1);
}
