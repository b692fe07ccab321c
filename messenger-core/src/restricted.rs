//! 受限视图（Restricted Messenger）
//!
//! 交给单个模块使用的总线外观：
//! - 只能注册/注销/发布自己命名空间 `name` 下的动作与事件；
//! - 只能调用 `allowed_actions` 中的动作，只能订阅 `allowed_events` 中的事件；
//!   白名单是唯一依据，自己命名空间下的类型也需要显式列出；
//! - 白名单检查通过后再转交给底层节点，底层节点自身的能力检查同样生效。
//!
use crate::bus::MessageBus;
use crate::error::{MessengerError, MessengerResult};
use crate::message::{Action, ActionHandler, Event, is_in_namespace, is_valid_namespace};
use crate::messenger::Messenger;
use crate::registry::SubscriptionId;
use crate::selector::Selector;
use bon::Builder;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// 受限视图参数
#[derive(Debug, Clone, Builder)]
pub struct RestrictedOptions {
    /// 模块命名空间
    #[builder(into)]
    name: String,
    #[builder(default)]
    allowed_actions: Vec<String>,
    #[builder(default)]
    allowed_events: Vec<String>,
}

/// 受限视图；克隆共享同一份白名单
#[derive(Clone)]
pub struct RestrictedMessenger {
    inner: Messenger,
    name: String,
    allowed_actions: Arc<HashSet<String>>,
    allowed_events: Arc<HashSet<String>>,
}

impl Messenger {
    /// 创建受限视图
    ///
    /// 白名单中的类型不做存在性检查，可以在对应处理器注册之前授予。
    pub fn get_restricted(&self, options: RestrictedOptions) -> MessengerResult<RestrictedMessenger> {
        let RestrictedOptions {
            name,
            allowed_actions,
            allowed_events,
        } = options;

        if !is_valid_namespace(&name) {
            return Err(MessengerError::InvalidNamespace { namespace: name });
        }
        if let Some(ns) = self.namespace().filter(|ns| *ns != name) {
            return Err(MessengerError::namespace_violation(ns, &name));
        }

        debug!(
            messenger = self.label(),
            name = %name,
            actions = allowed_actions.len(),
            events = allowed_events.len(),
            "created restricted messenger"
        );

        Ok(RestrictedMessenger {
            inner: self.clone(),
            name,
            allowed_actions: Arc::new(allowed_actions.into_iter().collect()),
            allowed_events: Arc::new(allowed_events.into_iter().collect()),
        })
    }
}

impl RestrictedMessenger {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn allowed_actions(&self) -> &HashSet<String> {
        &self.allowed_actions
    }

    pub fn allowed_events(&self) -> &HashSet<String> {
        &self.allowed_events
    }

    /// 视图所包装的底层节点
    pub fn messenger(&self) -> &Messenger {
        &self.inner
    }

    fn owns(&self, message_type: &str) -> bool {
        is_in_namespace(message_type, &self.name)
    }

    fn ensure_owned(&self, message_type: &str) -> MessengerResult<()> {
        if self.owns(message_type) {
            return Ok(());
        }
        Err(MessengerError::namespace_violation(&self.name, message_type))
    }

    fn ensure_callable(&self, action_type: &str) -> MessengerResult<()> {
        if self.allowed_actions.contains(action_type) {
            return Ok(());
        }
        Err(MessengerError::restriction_violation(&self.name, action_type))
    }

    fn ensure_subscribable(&self, event_type: &str) -> MessengerResult<()> {
        if self.allowed_events.contains(event_type) {
            return Ok(());
        }
        Err(MessengerError::restriction_violation(&self.name, event_type))
    }
}

impl fmt::Debug for RestrictedMessenger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestrictedMessenger")
            .field("name", &self.name)
            .field("allowed_actions", &self.allowed_actions)
            .field("allowed_events", &self.allowed_events)
            .finish()
    }
}

impl MessageBus for RestrictedMessenger {
    fn namespace(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn register_action_handler<A, H>(&self, handler: H) -> MessengerResult<()>
    where
        A: Action,
        H: ActionHandler<A>,
    {
        self.ensure_owned(A::TYPE)?;
        self.inner.register_action_handler::<A, H>(handler)
    }

    fn unregister_action_handler(&self, action_type: &str) -> MessengerResult<()> {
        self.ensure_owned(action_type)?;
        self.inner.unregister_action_handler(action_type)
    }

    fn call<A: Action>(&self, action: A) -> MessengerResult<A::Output> {
        self.ensure_callable(A::TYPE)?;
        self.inner.call(action)
    }

    fn publish<E: Event>(&self, payload: E) -> MessengerResult<()> {
        self.ensure_owned(E::TYPE)?;
        self.inner.publish(payload)
    }

    fn subscribe<E, F>(&self, listener: F) -> MessengerResult<SubscriptionId>
    where
        E: Event,
        F: Fn(&Arc<E>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.ensure_subscribable(E::TYPE)?;
        self.inner.subscribe::<E, F>(listener)
    }

    fn subscribe_with_selector<E, S, F>(
        &self,
        selector: Selector<E, S>,
        listener: F,
    ) -> MessengerResult<SubscriptionId>
    where
        E: Event,
        S: Clone + Send + 'static,
        F: Fn(S, Option<S>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.ensure_subscribable(E::TYPE)?;
        self.inner.subscribe_with_selector(selector, listener)
    }

    fn unsubscribe(&self, event_type: &str, subscription: SubscriptionId) -> MessengerResult<()> {
        self.ensure_subscribable(event_type)?;
        self.inner.unsubscribe(event_type, subscription)
    }

    fn register_initial_event_payload<E, F>(&self, producer: F) -> MessengerResult<()>
    where
        E: Event,
        F: Fn() -> E + Send + Sync + 'static,
    {
        self.ensure_owned(E::TYPE)?;
        self.inner.register_initial_event_payload(producer)
    }

    fn clear_event_subscriptions(&self, event_type: &str) -> MessengerResult<()> {
        self.ensure_owned(event_type)?;
        self.inner.clear_event_subscriptions(event_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use messenger_macros::{action, event};

    #[action(action_type = "A:getValue", output = u64)]
    struct GetValue;

    #[event(event_type = "A:valueChanged")]
    struct ValueChanged;

    #[action(action_type = "B:ping")]
    struct Ping;

    #[event(event_type = "B:pinged")]
    struct Pinged;

    #[test]
    fn options_default_to_empty_allow_lists() {
        let root = Messenger::root();
        let view = root
            .get_restricted(RestrictedOptions::builder().name("A").build())
            .unwrap();
        assert_eq!(view.name(), "A");
        assert_eq!(view.namespace(), Some("A"));
        assert!(view.allowed_actions().is_empty());
        assert!(view.allowed_events().is_empty());
    }

    #[test]
    fn own_namespace_still_needs_allow_list() {
        let root = Messenger::root();
        root.register_action_handler::<GetValue, _>(|_: GetValue| 42u64)
            .unwrap();
        let view = root
            .get_restricted(RestrictedOptions::builder().name("A").build())
            .unwrap();

        let err = view.call(GetValue).unwrap_err();
        assert!(matches!(
            err,
            MessengerError::RestrictionViolation { ref messenger, ref message_type }
                if messenger == "A" && message_type == "A:getValue"
        ));
        let err = view.subscribe::<ValueChanged, _>(|_| Ok(())).unwrap_err();
        assert!(matches!(err, MessengerError::RestrictionViolation { .. }));

        let listed = root
            .get_restricted(
                RestrictedOptions::builder()
                    .name("A")
                    .allowed_actions(vec!["A:getValue".to_string()])
                    .build(),
            )
            .unwrap();
        assert_eq!(listed.call(GetValue).unwrap(), 42);
    }

    #[test]
    fn external_types_need_allow_list() {
        let root = Messenger::root();
        root.register_action_handler::<Ping, _>(|_: Ping| ()).unwrap();
        let view = root
            .get_restricted(RestrictedOptions::builder().name("A").build())
            .unwrap();

        let err = view.call(Ping).unwrap_err();
        assert!(matches!(
            err,
            MessengerError::RestrictionViolation { ref messenger, .. } if messenger == "A"
        ));
        let err = view.subscribe::<Pinged, _>(|_| Ok(())).unwrap_err();
        assert!(matches!(err, MessengerError::RestrictionViolation { .. }));
        let err = view.publish(Pinged).unwrap_err();
        assert!(matches!(err, MessengerError::NamespaceViolation { .. }));
    }

    #[test]
    fn child_view_must_match_child_namespace() {
        let root = Messenger::root();
        let child = root.child("A").unwrap();
        let err = child
            .get_restricted(RestrictedOptions::builder().name("B").build())
            .unwrap_err();
        assert!(matches!(err, MessengerError::NamespaceViolation { .. }));
        assert!(
            child
                .get_restricted(RestrictedOptions::builder().name("A").build())
                .is_ok()
        );
    }
}
