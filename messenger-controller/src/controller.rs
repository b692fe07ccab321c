use messenger_core::{Action, Event};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// 控制器描述
///
/// 通常使用 `#[controller(name = "...", state = T)]` 派生，
/// 保证 `GET_STATE` / `STATE_CHANGE` 与 `NAME` 一致。
pub trait Controller: Send + Sync + 'static {
    const NAME: &'static str;
    const GET_STATE: &'static str;
    const STATE_CHANGE: &'static str;

    type State: Clone + PartialEq + Send + Sync + 'static;
}

/// `<Name>:getState` 动作
pub struct GetState<C>(PhantomData<fn() -> C>);

impl<C> GetState<C> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<C> Default for GetState<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Controller> Action for GetState<C> {
    const TYPE: &'static str = C::GET_STATE;
    type Output = Arc<C::State>;
}

/// `<Name>:stateChange` 事件
pub struct StateChange<C: Controller> {
    pub state: Arc<C::State>,
    pub previous: Arc<C::State>,
}

impl<C: Controller> Clone for StateChange<C> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            previous: self.previous.clone(),
        }
    }
}

impl<C: Controller> fmt::Debug for StateChange<C>
where
    C::State: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateChange")
            .field("controller", &C::NAME)
            .field("state", &self.state)
            .field("previous", &self.previous)
            .finish()
    }
}

impl<C: Controller> Event for StateChange<C> {
    const TYPE: &'static str = C::STATE_CHANGE;
}
