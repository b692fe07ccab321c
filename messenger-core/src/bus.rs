use crate::error::MessengerResult;
use crate::message::{Action, ActionHandler, Event};
use crate::registry::SubscriptionId;
use crate::selector::Selector;
use std::sync::Arc;

/// 消息总线（Message Bus）
///
/// - 模块只通过该接口与其他模块交互：注册自己拥有的动作、调用被授权的动作、
///   发布自己命名空间下的事件、订阅被授权的事件；
/// - 由 `Messenger`（根/子总线）与 `RestrictedMessenger`（受限视图）实现，
///   各实现负责自己的能力检查；
/// - 该 trait 带有泛型方法，通常以具体实现类型注入使用。
pub trait MessageBus: Send + Sync {
    /// 总线所属命名空间；根总线返回 `None`
    fn namespace(&self) -> Option<&str>;

    /// 注册动作处理器；同一类型在整棵委托树内只能注册一次
    fn register_action_handler<A, H>(&self, handler: H) -> MessengerResult<()>
    where
        A: Action,
        H: ActionHandler<A>;

    /// 注销动作处理器；不存在时为 no-op
    fn unregister_action_handler(&self, action_type: &str) -> MessengerResult<()>;

    /// 同步调用动作处理器并原样返回其结果（若为 future 则由调用方自行等待）
    fn call<A: Action>(&self, action: A) -> MessengerResult<A::Output>;

    /// 按注册顺序通知全部监听器，所有监听器共享同一份载荷
    fn publish<E: Event>(&self, payload: E) -> MessengerResult<()>;

    /// 订阅事件；订阅不会补发历史事件
    fn subscribe<E, F>(&self, listener: F) -> MessengerResult<SubscriptionId>
    where
        E: Event,
        F: Fn(&Arc<E>) -> anyhow::Result<()> + Send + Sync + 'static;

    /// 带选择器订阅：仅当选择结果变化时回调 `(新值, 旧值)`
    fn subscribe_with_selector<E, S, F>(
        &self,
        selector: Selector<E, S>,
        listener: F,
    ) -> MessengerResult<SubscriptionId>
    where
        E: Event,
        S: Clone + Send + 'static,
        F: Fn(S, Option<S>) -> anyhow::Result<()> + Send + Sync + 'static;

    /// 取消订阅；未找到对应监听器时返回 `ListenerNotFound`
    fn unsubscribe(&self, event_type: &str, subscription: SubscriptionId) -> MessengerResult<()>;

    /// 注册事件的初始载荷生成函数，供选择器订阅初始化缓存；重复注册将覆盖
    fn register_initial_event_payload<E, F>(&self, producer: F) -> MessengerResult<()>
    where
        E: Event,
        F: Fn() -> E + Send + Sync + 'static;

    /// 移除某事件的全部监听器
    fn clear_event_subscriptions(&self, event_type: &str) -> MessengerResult<()>;
}
