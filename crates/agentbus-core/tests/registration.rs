mod support;

use agentbus_core::{BusError, EventBus, EventType, Subscriber};
use std::sync::Arc;
use support::{journal, Ping, Pong, Recorder};

#[test]
fn test_register_then_remove_toggles_listener() {
    let bus = EventBus::new();
    let log = journal();
    let a = Recorder::new("a", &log);
    let ping = EventType::of::<Ping>();

    assert!(!bus.has_listener_for(ping));
    assert!(bus.register(&a, ping));
    assert!(bus.has_listener_for(ping));

    assert!(bus.remove(&a, ping));
    assert!(!bus.has_listener_for(ping));
    assert!(bus.registered_types().is_empty());
}

#[test]
fn test_register_is_idempotent() {
    let bus = EventBus::new();
    let log = journal();
    let a = Recorder::new("a", &log);

    assert!(bus.subscribe::<Ping>(&a));
    assert!(!bus.subscribe::<Ping>(&a));
    assert_eq!(bus.subscriber_count(EventType::of::<Ping>()), 1);

    bus.post(Ping::new(1)).expect("post");
    assert_eq!(*log.lock(), vec!["a:Ping#1"]);
}

#[test]
fn test_has_listener_is_exact_type() {
    let bus = EventBus::new();
    let log = journal();
    let a = Recorder::new("a", &log);
    bus.subscribe::<Ping>(&a);

    assert!(bus.has_listener_for(EventType::of::<Ping>()));
    assert!(!bus.has_listener_for(EventType::of::<Pong>()));
}

#[test]
fn test_remove_absent_is_noop() {
    let bus = EventBus::new();
    let log = journal();
    let a = Recorder::new("a", &log);
    let b = Recorder::new("b", &log);
    bus.subscribe::<Ping>(&a);

    assert!(!bus.remove(&b, EventType::of::<Ping>()));
    assert!(!bus.remove(&a, EventType::of::<Pong>()));
    assert_eq!(bus.subscriber_count(EventType::of::<Ping>()), 1);
}

#[test]
fn test_remove_keeps_other_subscribers() {
    let bus = EventBus::new();
    let log = journal();
    let a = Recorder::new("a", &log);
    let b = Recorder::new("b", &log);
    bus.subscribe::<Ping>(&a);
    bus.subscribe::<Ping>(&b);

    bus.remove(&a, EventType::of::<Ping>());
    assert!(bus.has_listener_for(EventType::of::<Ping>()));

    bus.post(Ping::new(1)).expect("post");
    assert_eq!(*log.lock(), vec!["b:Ping#1"]);
}

#[test]
fn test_batch_register_and_remove() {
    let bus = EventBus::new();
    let log = journal();
    let a = Recorder::new("a", &log);
    let types = [EventType::of::<Ping>(), EventType::of::<Pong>()];

    assert_eq!(bus.register_all(&a, &types).expect("register"), 2);
    assert_eq!(bus.register_all(&a, &types).expect("register"), 0);
    assert!(bus.has_listener_for(types[0]));
    assert!(bus.has_listener_for(types[1]));

    assert_eq!(bus.remove_all(&a, &types[..1]).expect("remove"), 1);
    assert!(!bus.has_listener_for(types[0]));
    assert!(bus.has_listener_for(types[1]));
}

#[test]
fn test_batch_with_empty_list_is_rejected() {
    let bus = EventBus::new();
    let log = journal();
    let a = Recorder::new("a", &log);

    let err = bus.register_all(&a, &[]).expect_err("empty list");
    assert!(matches!(err, BusError::EmptyTypeList));
    assert!(err.is_contract_violation());
    assert!(bus.registered_types().is_empty());

    assert!(matches!(
        bus.remove_all(&a, &[]),
        Err(BusError::EmptyTypeList)
    ));
}

#[test]
fn test_remove_subscriber_from_every_type() {
    let bus = EventBus::new();
    let log = journal();
    let a = Recorder::new("a", &log);
    let b = Recorder::new("b", &log);
    bus.subscribe::<Ping>(&a);
    bus.subscribe::<Pong>(&a);
    bus.subscribe::<Pong>(&b);

    assert_eq!(bus.remove_subscriber(&a), 2);
    assert!(!bus.has_listener_for(EventType::of::<Ping>()));
    assert!(bus.has_listener_for(EventType::of::<Pong>()));

    bus.post(Ping::new(1)).expect("post");
    bus.post(Pong { seq: 2 }).expect("post");
    assert_eq!(*log.lock(), vec!["b:Pong#2"]);

    assert_eq!(bus.remove_subscriber(&a), 0);
}

#[test]
fn test_register_weak_rejects_dropped_subscriber() {
    let bus = EventBus::new();
    let log = journal();
    let a = Recorder::new("a", &log);
    let weak = Arc::downgrade(&a);

    assert!(bus
        .register_weak(weak.clone(), EventType::of::<Ping>())
        .expect("live subscriber"));

    drop(a);
    let err = bus
        .register_weak(weak, EventType::of::<Pong>())
        .expect_err("dropped subscriber");
    assert!(matches!(err, BusError::SubscriberDropped { .. }));
    assert!(!bus.has_listener_for(EventType::of::<Pong>()));
}

#[test]
fn test_bus_does_not_own_subscribers() {
    let bus = EventBus::new();
    let log = journal();
    let a: Arc<dyn Subscriber> = Recorder::new("a", &log);
    bus.subscribe::<Ping>(&a);

    assert_eq!(Arc::strong_count(&a), 1);
    drop(a);
    bus.post(Ping::new(1)).expect("post");
    assert!(log.lock().is_empty());
}
