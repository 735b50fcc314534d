//! A miniature route dispatch loop: one authentication middleware that never
//! suspends, one lookup middleware that does, and a counting gate keeping at
//! most two lookups in flight.
//!
//! Run with `cargo run --example route_chain`.

use std::cell::RefCell;
use std::rc::Rc;

use baton::{CountingGate, Middleware, Next};
use futures_channel::oneshot;
use futures_executor::LocalPool;
use tracing::info;

#[derive(Debug, Clone)]
struct Request {
  user: &'static str,
  path: &'static str,
}

type Response = Rc<RefCell<Vec<String>>>;

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    )
    .init();

  let mut pool = LocalPool::new();

  // Synchronous middleware: anonymous users skip the rest of the route.
  let auth = Rc::new(Middleware::new(
    |request: Request, response: Response, _progress| async move {
      if request.user == "anonymous" {
        response.borrow_mut().push("401 unauthorized".to_string());
        return Ok::<_, String>("route");
      }
      Ok("next")
    },
    pool.spawner(),
  ));

  // Suspending middleware: waits for a (simulated) backend lookup before
  // writing the response body.
  let pending: Rc<RefCell<Vec<oneshot::Sender<String>>>> = Rc::new(RefCell::new(Vec::new()));
  let backlog = pending.clone();
  let lookup = Rc::new(Middleware::new(
    move |request: Request, response: Response, _progress| {
      let (tx, rx) = oneshot::channel();
      backlog.borrow_mut().push(tx);
      async move {
        let record = rx.await.expect("backend stays alive");
        response
          .borrow_mut()
          .push(format!("200 {} -> {record}", request.path));
        Ok::<_, String>("next")
      }
    },
    pool.spawner(),
  ));

  // At most two chains in flight; further dispatches queue on the gate.
  let gate = CountingGate::new(2);

  let requests = [
    Request { user: "ada", path: "/profile" },
    Request { user: "anonymous", path: "/profile" },
    Request { user: "grace", path: "/orders" },
    Request { user: "linus", path: "/orders" },
  ];

  let responses: Vec<Response> = requests.iter().map(|_| Response::default()).collect();

  for (request, response) in requests.iter().cloned().zip(responses.iter().cloned()) {
    let auth = auth.clone();
    let lookup = lookup.clone();
    let release = gate.clone();
    gate.enter(move || {
      let chain_release = release.clone();
      let chained = {
        let request = request.clone();
        let response = response.clone();
        Next::new(move |fault| match fault {
          // Auth said "next": hand the chain to the lookup middleware. Its
          // continuation is the tail of the chain and returns the gate slot
          // once the lookup settles.
          None => {
            let done = chain_release.clone();
            lookup
              .call(
                request,
                response,
                Some(Next::new(move |fault| {
                  assert!(fault.is_none(), "lookup never faults in this demo");
                  done.leave();
                })),
              )
              .expect("dispatch lookup");
          }
          Some(fault) if fault.is_route() => {
            info!("route skipped");
            chain_release.leave();
          }
          Some(fault) => {
            info!(%fault, "chain aborted");
            chain_release.leave();
          }
        })
      };
      auth.call(request, response, Some(chained)).expect("dispatch auth");
    });
  }

  info!(queued = gate.waiting(), "requests dispatched");

  // Resolve the backend lookups, then drain the executor.
  while pending.borrow().len() > 0 || gate.waiting() > 0 {
    let senders: Vec<_> = pending.borrow_mut().drain(..).collect();
    for tx in senders {
      tx.send("record".to_string()).ok();
    }
    pool.run_until_stalled();
  }

  for (request, response) in requests.iter().zip(responses.iter()) {
    info!(user = request.user, path = request.path, response = ?response.borrow(), "settled");
  }
}
