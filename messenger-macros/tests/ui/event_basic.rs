use messenger_core::{Event, Messenger, MessageBus};
use messenger_macros::event;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

#[event(event_type = "Accounts:selectedChanged")]
#[derive(Debug, Clone, PartialEq)]
struct SelectedChanged {
    address: String,
}

#[event(event_type = "Clock:tick")]
struct Tick(u32);

fn main() {
    assert_eq!(SelectedChanged::TYPE, "Accounts:selectedChanged");
    assert_eq!(Tick::TYPE, "Clock:tick");

    let root = Messenger::root();
    let total = Arc::new(AtomicU32::new(0));
    let sink = total.clone();
    root.subscribe::<Tick, _>(move |t| {
        sink.fetch_add(t.0, Ordering::SeqCst);
        Ok(())
    })
    .unwrap();

    root.publish(Tick(2)).unwrap();
    root.publish(Tick(3)).unwrap();
    root.publish(SelectedChanged {
        address: "0x1".into(),
    })
    .unwrap();
    assert_eq!(total.load(Ordering::SeqCst), 5);
}
