use messenger_core::{MessageBus, Messenger, MessengerError, RestrictedOptions};
use messenger_macros::{action, event};
use std::sync::{Arc, Mutex};

#[action(action_type = "A:getValue", output = u64)]
struct GetValue;

#[event(event_type = "A:valueChanged")]
struct ValueChanged {
    v: u64,
}

#[action(action_type = "B:doThing")]
struct DoThing;

fn view(root: &Messenger, name: &str, actions: &[&str], events: &[&str]) -> messenger_core::RestrictedMessenger {
    root.get_restricted(
        RestrictedOptions::builder()
            .name(name)
            .allowed_actions(actions.iter().map(|a| a.to_string()).collect())
            .allowed_events(events.iter().map(|e| e.to_string()).collect())
            .build(),
    )
    .unwrap()
}

#[test]
fn modules_reach_each_other_only_through_allow_lists() {
    let root = Messenger::root();
    let a = view(&root, "A", &[], &[]);
    let b = view(&root, "B", &["A:getValue"], &[]);
    let c = view(&root, "C", &[], &[]);

    a.register_action_handler::<GetValue, _>(|_: GetValue| 42u64)
        .unwrap();

    assert_eq!(b.call(GetValue).unwrap(), 42);
    let err = c.call(GetValue).unwrap_err();
    assert!(matches!(
        err,
        MessengerError::RestrictionViolation { ref messenger, ref message_type }
            if messenger == "C" && message_type == "A:getValue"
    ));
}

#[test]
fn view_cannot_register_outside_its_namespace() {
    let root = Messenger::root();
    let a = view(&root, "A", &["B:doThing"], &[]);

    let err = a
        .register_action_handler::<DoThing, _>(|_: DoThing| ())
        .unwrap_err();
    assert!(matches!(
        err,
        MessengerError::NamespaceViolation { ref namespace, ref message_type }
            if namespace == "A" && message_type == "B:doThing"
    ));
    let err = a.unregister_action_handler("B:doThing").unwrap_err();
    assert!(matches!(err, MessengerError::NamespaceViolation { .. }));
    let err = a.clear_event_subscriptions("B:thingDone").unwrap_err();
    assert!(matches!(err, MessengerError::NamespaceViolation { .. }));
}

#[test]
fn allowed_types_may_be_granted_before_registration() {
    let root = Messenger::root();
    let b = view(&root, "B", &["A:getValue"], &["A:valueChanged"]);

    let err = b.call(GetValue).unwrap_err();
    assert!(matches!(err, MessengerError::ActionNotFound { .. }));

    let seen: Arc<Mutex<Vec<u64>>> = Arc::default();
    let sink = seen.clone();
    b.subscribe::<ValueChanged, _>(move |e| {
        sink.lock().unwrap().push(e.v);
        Ok(())
    })
    .unwrap();

    let a = view(&root, "A", &[], &[]);
    a.publish(ValueChanged { v: 3 }).unwrap();
    assert_eq!(*seen.lock().unwrap(), [3]);
}

#[test]
fn unsubscribe_requires_the_same_allowance() {
    let root = Messenger::root();
    let id = root.subscribe::<ValueChanged, _>(|_| Ok(())).unwrap();
    let c = view(&root, "C", &[], &[]);

    let err = c.unsubscribe("A:valueChanged", id).unwrap_err();
    assert!(matches!(err, MessengerError::RestrictionViolation { .. }));
    root.unsubscribe("A:valueChanged", id).unwrap();
}

#[test]
fn view_over_child_applies_both_checks() {
    let root = Messenger::root();
    root.register_action_handler::<DoThing, _>(|_: DoThing| ())
        .unwrap();
    let child = root.child("A").unwrap();
    // 视图放行了 B:doThing，但子总线本身没有被委托
    let a = view(&child, "A", &["B:doThing"], &[]);

    let err = a.call(DoThing).unwrap_err();
    assert!(matches!(
        err,
        MessengerError::RestrictionViolation { ref messenger, .. } if messenger == "A"
    ));
}

#[test]
fn view_name_is_validated() {
    let root = Messenger::root();
    for bad in ["", "A:B"] {
        let err = root
            .get_restricted(RestrictedOptions::builder().name(bad).build())
            .unwrap_err();
        assert!(matches!(err, MessengerError::InvalidNamespace { .. }));
    }
}
