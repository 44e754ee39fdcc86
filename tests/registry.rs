// Registry integration tests.
//
// Invariants exercised:
// - Subscription is by handler identity and never keeps a handler alive.
// - publish invokes every live handler exactly once.
// - Two registries are independent instances.
use rc_weakset::{Handler, Registry};
use std::cell::RefCell;
use std::rc::Rc;

struct Listener {
    handler: Handler<str>,
}

impl Listener {
    fn new(name: &'static str, log: &Rc<RefCell<Vec<String>>>) -> Self {
        let l = log.clone();
        let handler: Handler<str> =
            Rc::new(move |e: &str| l.borrow_mut().push(format!("{name}:{e}")));
        Listener { handler }
    }
}

// Test: dropping a listener ends its subscription.
#[test]
fn owner_drop_ends_subscription() {
    let reg: Registry<str> = Registry::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    let a = Listener::new("a", &log);
    let b = Listener::new("b", &log);
    assert!(reg.subscribe(&a.handler));
    assert!(reg.subscribe(&b.handler));

    assert_eq!(reg.publish("1"), 2);
    drop(b);
    assert_eq!(reg.publish("2"), 1);
    assert_eq!(reg.subscriber_count(), 1);

    let mut entries = log.borrow().clone();
    entries.sort();
    assert_eq!(entries, vec!["a:1", "a:2", "b:1"]);
}

// Test: registries are explicit instances.
#[test]
fn registries_are_independent() {
    let first: Registry<str> = Registry::new();
    let second: Registry<str> = Registry::default();
    let log = Rc::new(RefCell::new(Vec::new()));
    let a = Listener::new("a", &log);
    first.subscribe(&a.handler);

    assert_eq!(second.publish("x"), 0);
    assert_eq!(first.publish("x"), 1);
    assert!(!second.unsubscribe(&a.handler));
    assert!(first.unsubscribe(&a.handler));
    assert!(!first.unsubscribe(&a.handler));
}
