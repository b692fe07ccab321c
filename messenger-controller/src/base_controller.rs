//! 控制器基类
//!
//! 持有状态并通过总线暴露：
//! - 构造时注册 `<Name>:getState` 处理器与 `<Name>:stateChange` 的初始载荷，
//!   因此选择器订阅者从当前状态开始比较；
//! - `update` 只在状态确实变化时发布事件；
//! - `destroy` 注销动作并清除状态事件的订阅。
//!
use crate::controller::{Controller, GetState, StateChange};
use crate::error::{ControllerError, ControllerResult};
use messenger_core::MessageBus;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

pub struct BaseController<C: Controller, B: MessageBus> {
    bus: B,
    state: Arc<RwLock<Arc<C::State>>>,
}

impl<C: Controller, B: MessageBus> BaseController<C, B> {
    /// `bus` 的命名空间必须等于 `C::NAME`
    pub fn new(bus: B, state: C::State) -> ControllerResult<Self> {
        if bus.namespace() != Some(C::NAME) {
            return Err(ControllerError::NamespaceMismatch {
                expected: C::NAME,
                found: bus.namespace().unwrap_or("root").to_string(),
            });
        }
        check_descriptor::<C>(C::GET_STATE, "getState")?;
        check_descriptor::<C>(C::STATE_CHANGE, "stateChange")?;

        let state = Arc::new(RwLock::new(Arc::new(state)));

        let reader = state.clone();
        bus.register_action_handler::<GetState<C>, _>(move |_: GetState<C>| reader.read().clone())?;

        let initial = state.clone();
        bus.register_initial_event_payload::<StateChange<C>, _>(move || {
            let current = initial.read().clone();
            StateChange {
                state: current.clone(),
                previous: current,
            }
        })?;

        debug!(controller = C::NAME, "controller registered");
        Ok(Self { bus, state })
    }

    /// 当前状态快照
    pub fn state(&self) -> Arc<C::State> {
        self.state.read().clone()
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// 在状态副本上应用 `f`；状态变化时发布 `stateChange` 并返回 `true`
    ///
    /// `f` 执行期间持有写锁，不要在其中访问本控制器。
    pub fn update<F>(&self, f: F) -> ControllerResult<bool>
    where
        F: FnOnce(&mut C::State),
    {
        let change = {
            let mut current = self.state.write();
            let mut next = C::State::clone(&current);
            f(&mut next);
            if next == **current {
                None
            } else {
                let previous = std::mem::replace(&mut *current, Arc::new(next));
                Some(StateChange::<C> {
                    state: current.clone(),
                    previous,
                })
            }
        };

        let Some(change) = change else {
            return Ok(false);
        };
        // 锁已释放，监听器可以重入调用 getState
        self.bus.publish(change)?;
        Ok(true)
    }

    /// 注销 `getState` 并移除 `stateChange` 的全部订阅
    pub fn destroy(self) -> ControllerResult<()> {
        self.bus.unregister_action_handler(C::GET_STATE)?;
        self.bus.clear_event_subscriptions(C::STATE_CHANGE)?;
        debug!(controller = C::NAME, "controller destroyed");
        Ok(())
    }
}

fn check_descriptor<C: Controller>(
    message_type: &'static str,
    verb: &str,
) -> ControllerResult<()> {
    let expected = message_type
        .strip_prefix(C::NAME)
        .and_then(|rest| rest.strip_prefix(':'))
        == Some(verb);
    if expected {
        return Ok(());
    }
    Err(ControllerError::InvalidDescriptor {
        controller: C::NAME,
        message_type,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use messenger_core::Messenger;
    use messenger_macros::controller;

    #[controller(name = "Counter", state = u32)]
    struct Counter;

    struct Mislabeled;

    impl Controller for Mislabeled {
        const NAME: &'static str = "Counter";
        const GET_STATE: &'static str = "Counter:get";
        const STATE_CHANGE: &'static str = "Counter:stateChange";
        type State = u32;
    }

    #[test]
    fn requires_matching_namespace() {
        let root = Messenger::root();
        let err = BaseController::<Counter, _>::new(root.clone(), 0).err().unwrap();
        assert!(matches!(
            err,
            ControllerError::NamespaceMismatch { expected: "Counter", ref found } if found == "root"
        ));

        let other = root.child("Other").unwrap();
        assert!(BaseController::<Counter, _>::new(other, 0).is_err());
    }

    #[test]
    fn rejects_descriptor_outside_convention() {
        let bus = Messenger::root().child("Counter").unwrap();
        let err = BaseController::<Mislabeled, _>::new(bus, 0).err().unwrap();
        assert!(matches!(
            err,
            ControllerError::InvalidDescriptor { message_type: "Counter:get", .. }
        ));
    }

    #[test]
    fn unchanged_update_does_not_publish() {
        let bus = Messenger::root().child("Counter").unwrap();
        let controller = BaseController::<Counter, _>::new(bus, 1).unwrap();
        assert!(!controller.update(|n| *n = 1).unwrap());
        assert!(controller.update(|n| *n += 1).unwrap());
        assert_eq!(*controller.state(), 2);
    }
}
