//! 总线节点（Messenger）
//!
//! 根总线与子总线共享同一个根注册表（`Registry`），节点本身只描述“能力”：
//! - 根总线：无命名空间，可注册/发布/调用/订阅任意类型；
//! - 子总线：只能在自己的命名空间下注册动作与发布事件；可调用/订阅的范围为
//!   自身命名空间、父节点委托给它的类型，以及其后代命名空间下的类型
//!   （子节点注册的能力对所有祖先可见，祖先可以再将其委托给其他子节点）。
//!
//! 父子关系在创建子总线时确定且不可更改，因此委托关系天然构成一棵树。
//!
use crate::bus::MessageBus;
use crate::config::MessengerConfig;
use crate::error::{MessengerError, MessengerResult};
use crate::message::{Action, ActionHandler, Event, is_in_namespace, is_valid_namespace};
use crate::registry::{Payload, Registry, ScopeId, SubscriptionId, typed_listener};
use crate::selector::Selector;
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

pub(crate) struct Scope {
    pub(crate) id: ScopeId,
    namespace: Option<String>,
    // 指向父节点用弱引用，子节点列表用强引用，避免父子互相持有
    pub(crate) parent: Option<Weak<Scope>>,
    pub(crate) delegated_actions: RwLock<HashSet<String>>,
    pub(crate) delegated_events: RwLock<HashSet<String>>,
    children: Mutex<Vec<Arc<Scope>>>,
}

impl Scope {
    fn new(id: ScopeId, namespace: Option<String>, parent: Option<Weak<Scope>>) -> Self {
        Self {
            id,
            namespace,
            parent,
            delegated_actions: RwLock::new(HashSet::new()),
            delegated_events: RwLock::new(HashSet::new()),
            children: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn label(&self) -> &str {
        self.namespace.as_deref().unwrap_or("root")
    }

    fn is_root(&self) -> bool {
        self.namespace.is_none()
    }

    fn owns(&self, message_type: &str) -> bool {
        self.namespace
            .as_deref()
            .is_some_and(|ns| is_in_namespace(message_type, ns))
    }

    /// 直接子节点；子节点随其所在的树存活，不因句柄释放而消失
    pub(crate) fn children(&self) -> Vec<Arc<Scope>> {
        self.children.lock().clone()
    }

    fn descendant_owns(&self, message_type: &str) -> bool {
        self.children()
            .iter()
            .any(|c| c.owns(message_type) || c.descendant_owns(message_type))
    }

    pub(crate) fn can_call(&self, action_type: &str) -> bool {
        self.is_root()
            || self.owns(action_type)
            || self.delegated_actions.read().contains(action_type)
            || self.descendant_owns(action_type)
    }

    pub(crate) fn can_subscribe(&self, event_type: &str) -> bool {
        self.is_root()
            || self.owns(event_type)
            || self.delegated_events.read().contains(event_type)
            || self.descendant_owns(event_type)
    }
}

/// 总线节点句柄；克隆开销很小，所有克隆指向同一节点
#[derive(Clone)]
pub struct Messenger {
    pub(crate) registry: Arc<Registry>,
    pub(crate) scope: Arc<Scope>,
}

impl Messenger {
    /// 以默认配置创建根总线（每个进程一个，显式注入，不存在全局实例）
    pub fn root() -> Self {
        Self::with_config(MessengerConfig::default())
    }

    /// 以自定义配置创建根总线
    pub fn with_config(config: MessengerConfig) -> Self {
        let registry = Arc::new(Registry::new(config));
        let scope = Arc::new(Scope::new(registry.next_scope_id(), None, None));
        Self { registry, scope }
    }

    /// 创建以 `namespace` 为命名空间的子总线
    pub fn child(&self, namespace: impl Into<String>) -> MessengerResult<Messenger> {
        let namespace = namespace.into();
        if !is_valid_namespace(&namespace) {
            return Err(MessengerError::InvalidNamespace { namespace });
        }

        let scope = Arc::new(Scope::new(
            self.registry.next_scope_id(),
            Some(namespace),
            Some(Arc::downgrade(&self.scope)),
        ));
        self.scope.children.lock().push(scope.clone());
        debug!(
            parent = self.scope.label(),
            child = scope.label(),
            "created child messenger"
        );

        Ok(Self {
            registry: self.registry.clone(),
            scope,
        })
    }

    pub fn is_root(&self) -> bool {
        self.scope.is_root()
    }

    pub fn config(&self) -> &MessengerConfig {
        self.registry.config()
    }

    /// 是否已存在该动作的处理器（整棵树范围）
    pub fn has_action_handler(&self, action_type: &str) -> bool {
        self.registry.has_handler(action_type)
    }

    /// 根总线：移除全部监听器；子总线：仅移除由本节点注册的监听器
    pub fn clear_subscriptions(&self) {
        if self.is_root() {
            self.registry.clear_listeners_where(|_, _| true);
        } else {
            let id = self.scope.id;
            self.registry.clear_listeners_where(|_, owner| owner == id);
        }
        debug!(messenger = self.scope.label(), "cleared subscriptions");
    }

    /// 根总线：移除全部处理器与初始载荷；子总线：仅移除本命名空间下的
    pub fn clear_action_handlers(&self) {
        if self.is_root() {
            self.registry.clear_handlers_where(|_| true);
            self.registry.clear_initial_payloads_where(|_| true);
        } else {
            let scope = self.scope.clone();
            self.registry.clear_handlers_where(|t| scope.owns(t));
            self.registry.clear_initial_payloads_where(|t| scope.owns(t));
        }
        debug!(messenger = self.scope.label(), "cleared action handlers");
    }

    pub(crate) fn label(&self) -> &str {
        self.scope.label()
    }

    fn ensure_owned(&self, message_type: &str) -> MessengerResult<()> {
        if self.is_root() || self.scope.owns(message_type) {
            return Ok(());
        }
        Err(MessengerError::namespace_violation(
            self.label(),
            message_type,
        ))
    }

    fn ensure_callable(&self, action_type: &str) -> MessengerResult<()> {
        if self.scope.can_call(action_type) {
            return Ok(());
        }
        Err(MessengerError::restriction_violation(
            self.label(),
            action_type,
        ))
    }

    fn ensure_subscribable(&self, event_type: &str) -> MessengerResult<()> {
        if self.scope.can_subscribe(event_type) {
            return Ok(());
        }
        Err(MessengerError::restriction_violation(
            self.label(),
            event_type,
        ))
    }
}

impl fmt::Debug for Messenger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Messenger")
            .field("namespace", &self.scope.namespace)
            .field("scope", &self.scope.id)
            .finish()
    }
}

impl MessageBus for Messenger {
    fn namespace(&self) -> Option<&str> {
        self.scope.namespace.as_deref()
    }

    fn register_action_handler<A, H>(&self, handler: H) -> MessengerResult<()>
    where
        A: Action,
        H: ActionHandler<A>,
    {
        self.ensure_owned(A::TYPE)?;
        self.registry.register_handler::<A, H>(handler)
    }

    fn unregister_action_handler(&self, action_type: &str) -> MessengerResult<()> {
        self.ensure_owned(action_type)?;
        self.registry.unregister_handler(action_type);
        Ok(())
    }

    fn call<A: Action>(&self, action: A) -> MessengerResult<A::Output> {
        self.ensure_callable(A::TYPE)?;
        self.registry.call(action)
    }

    fn publish<E: Event>(&self, payload: E) -> MessengerResult<()> {
        self.ensure_owned(E::TYPE)?;
        self.registry.publish(payload)
    }

    fn subscribe<E, F>(&self, listener: F) -> MessengerResult<SubscriptionId>
    where
        E: Event,
        F: Fn(&Arc<E>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.ensure_subscribable(E::TYPE)?;
        Ok(self
            .registry
            .subscribe(E::TYPE, self.scope.id, typed_listener::<E, F>(listener)))
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

        let initial = self
            .registry
            .initial_payload(E::TYPE)
            .and_then(|payload| payload.downcast::<E>().ok())
            .map(|payload| selector.select(&payload));
        let on_event = selector.into_listener(initial, listener);

        Ok(self
            .registry
            .subscribe(E::TYPE, self.scope.id, typed_listener::<E, _>(on_event)))
    }

    fn unsubscribe(&self, event_type: &str, subscription: SubscriptionId) -> MessengerResult<()> {
        self.ensure_subscribable(event_type)?;
        self.registry.unsubscribe(event_type, subscription)
    }

    fn register_initial_event_payload<E, F>(&self, producer: F) -> MessengerResult<()>
    where
        E: Event,
        F: Fn() -> E + Send + Sync + 'static,
    {
        self.ensure_owned(E::TYPE)?;
        self.registry
            .register_initial_payload(E::TYPE, Arc::new(move || Arc::new(producer()) as Payload));
        Ok(())
    }

    fn clear_event_subscriptions(&self, event_type: &str) -> MessengerResult<()> {
        self.ensure_owned(event_type)?;
        let removed = self.registry.clear_event(event_type);
        debug!(event = event_type, removed, "cleared event subscriptions");
        Ok(())
    }
}
