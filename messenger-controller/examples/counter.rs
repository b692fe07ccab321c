use messenger_controller::{BaseController, GetState, StateChange};
use messenger_core::{MessageBus, Messenger, RestrictedOptions, Selector};
use messenger_macros::controller;

#[derive(Debug, Clone, Default, PartialEq)]
struct CounterState {
    count: u64,
    label: String,
}

#[controller(name = "Counter", state = CounterState)]
struct Counter;

fn main() -> anyhow::Result<()> {
    let root = Messenger::root();

    let bus = root.get_restricted(RestrictedOptions::builder().name("Counter").build())?;
    let counter = BaseController::<Counter, _>::new(bus, CounterState::default())?;

    let viewer = root.get_restricted(
        RestrictedOptions::builder()
            .name("Viewer")
            .allowed_actions(vec!["Counter:getState".into()])
            .allowed_events(vec!["Counter:stateChange".into()])
            .build(),
    )?;

    viewer.subscribe_with_selector(
        Selector::new(|e: &StateChange<Counter>| e.state.count),
        |count, previous| {
            println!("count: {previous:?} -> {count}");
            Ok(())
        },
    )?;

    for _ in 0..3 {
        counter.update(|s| s.count += 1)?;
    }
    // 仅修改 label，选择器不会触发
    counter.update(|s| s.label = "renamed".into())?;

    let state = viewer.call(GetState::<Counter>::new())?;
    println!("final state: {state:?}");
    Ok(())
}
