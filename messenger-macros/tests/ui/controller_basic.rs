use messenger_controller::Controller;
use messenger_macros::controller;

#[derive(Debug, Clone, Default, PartialEq)]
struct CounterState {
    count: u64,
}

#[controller(name = "Counter", state = CounterState)]
struct Counter;

fn main() {
    assert_eq!(Counter::NAME, "Counter");
    assert_eq!(Counter::GET_STATE, "Counter:getState");
    assert_eq!(Counter::STATE_CHANGE, "Counter:stateChange");
    let state: <Counter as Controller>::State = CounterState::default();
    assert_eq!(state.count, 0);
}
