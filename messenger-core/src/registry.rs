//! 根注册表（Registry）
//!
//! 整棵委托树唯一的处理器/监听器存储：
//! - 处理器表：类型字符串 -> 类型擦除后的处理器，每个类型至多一个；
//! - 监听器表：类型字符串 -> 按注册顺序排列的监听器列表；
//! - 初始载荷表：类型字符串 -> 载荷生成函数，用于选择器订阅时初始化缓存值。
//!
//! 派发前先把条目克隆出表再调用，任何锁都不会跨越一次派发，因此处理器/监听器
//! 可以重入地再次调用 `call`/`publish`/`subscribe`/`unsubscribe`。
//!
use crate::config::{ListenerErrorPolicy, MessengerConfig};
use crate::error::{ListenerFailure, MessengerError, MessengerResult};
use crate::message::{Action, ActionHandler, Event};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::any::{Any, TypeId, type_name};
use std::collections::HashSet;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, trace, warn};

type BoxAnySend = Box<dyn Any + Send>;

/// 事件载荷：一次发布内所有监听器共享同一份引用
pub(crate) type Payload = Arc<dyn Any + Send + Sync>;

type HandlerFn = Arc<dyn Fn(BoxAnySend) -> MessengerResult<BoxAnySend> + Send + Sync>;

pub(crate) type ListenerFn = Arc<dyn Fn(&Payload) -> anyhow::Result<()> + Send + Sync>;

pub(crate) type PayloadFn = Arc<dyn Fn() -> Payload + Send + Sync>;

/// 订阅标识，由 `subscribe` 返回，用于 `unsubscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscription-{}", self.0)
    }
}

/// 委托树节点标识，记录监听器由哪个总线节点注册
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ScopeId(u64);

#[derive(Clone)]
struct HandlerEntry {
    action: TypeId,
    action_name: &'static str,
    handler: HandlerFn,
}

#[derive(Clone)]
struct ListenerEntry {
    id: SubscriptionId,
    owner: ScopeId,
    callback: ListenerFn,
}

pub(crate) struct Registry {
    config: MessengerConfig,
    handlers: DashMap<String, HandlerEntry>,
    listeners: DashMap<String, Vec<ListenerEntry>>,
    initial_payloads: DashMap<String, PayloadFn>,
    next_id: AtomicU64,
}

impl Registry {
    pub(crate) fn new(config: MessengerConfig) -> Self {
        Self {
            config,
            handlers: DashMap::new(),
            listeners: DashMap::new(),
            initial_payloads: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub(crate) fn config(&self) -> &MessengerConfig {
        &self.config
    }

    pub(crate) fn next_scope_id(&self) -> ScopeId {
        ScopeId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn next_subscription_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    // ---- 动作 ----

    pub(crate) fn register_handler<A, H>(&self, handler: H) -> MessengerResult<()>
    where
        A: Action,
        H: ActionHandler<A>,
    {
        let f: HandlerFn = Arc::new(move |boxed| match boxed.downcast::<A>() {
            Ok(action) => Ok(Box::new(handler.handle(*action)) as BoxAnySend),
            Err(_) => Err(MessengerError::TypeMismatch {
                expected: type_name::<A>(),
                found: "unknown",
            }),
        });

        match self.handlers.entry(A::TYPE.to_string()) {
            Entry::Occupied(_) => Err(MessengerError::DuplicateHandler {
                action: A::TYPE.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(HandlerEntry {
                    action: TypeId::of::<A>(),
                    action_name: type_name::<A>(),
                    handler: f,
                });
                debug!(action = A::TYPE, "registered action handler");
                Ok(())
            }
        }
    }

    pub(crate) fn unregister_handler(&self, action_type: &str) -> bool {
        let removed = self.handlers.remove(action_type).is_some();
        if removed {
            debug!(action = action_type, "unregistered action handler");
        }
        removed
    }

    pub(crate) fn clear_handlers_where(&self, pred: impl Fn(&str) -> bool) {
        self.handlers.retain(|action_type, _| !pred(action_type));
    }

    pub(crate) fn has_handler(&self, action_type: &str) -> bool {
        self.handlers.contains_key(action_type)
    }

    pub(crate) fn call<A: Action>(&self, action: A) -> MessengerResult<A::Output> {
        let Some(entry) = self.handlers.get(A::TYPE).map(|h| h.value().clone()) else {
            return Err(MessengerError::ActionNotFound {
                action: A::TYPE.to_string(),
            });
        };

        if entry.action != TypeId::of::<A>() {
            return Err(MessengerError::TypeMismatch {
                expected: entry.action_name,
                found: type_name::<A>(),
            });
        }

        if self.config.trace_dispatch {
            trace!(action = A::TYPE, "dispatching action");
        }

        let out = (entry.handler)(Box::new(action))?;

        match out.downcast::<A::Output>() {
            Ok(output) => Ok(*output),
            Err(_) => Err(MessengerError::TypeMismatch {
                expected: type_name::<A::Output>(),
                found: "unknown",
            }),
        }
    }

    // ---- 事件 ----

    pub(crate) fn subscribe(
        &self,
        event_type: &str,
        owner: ScopeId,
        callback: ListenerFn,
    ) -> SubscriptionId {
        let id = self.next_subscription_id();
        self.listeners
            .entry(event_type.to_string())
            .or_default()
            .push(ListenerEntry {
                id,
                owner,
                callback,
            });
        debug!(event = event_type, subscription = %id, "subscribed listener");
        id
    }

    pub(crate) fn unsubscribe(&self, event_type: &str, id: SubscriptionId) -> MessengerResult<()> {
        let removed = match self.listeners.get_mut(event_type) {
            Some(mut list) => match list.iter().position(|l| l.id == id) {
                Some(pos) => {
                    list.remove(pos);
                    true
                }
                None => false,
            },
            None => false,
        };

        if !removed {
            return Err(MessengerError::ListenerNotFound {
                event: event_type.to_string(),
                subscription: id,
            });
        }

        self.listeners.remove_if(event_type, |_, list| list.is_empty());
        debug!(event = event_type, subscription = %id, "unsubscribed listener");
        Ok(())
    }

    pub(crate) fn clear_event(&self, event_type: &str) -> usize {
        self.listeners
            .remove(event_type)
            .map(|(_, list)| list.len())
            .unwrap_or(0)
    }

    /// 移除指定事件下由给定节点注册的监听器
    pub(crate) fn remove_listeners_owned_by(
        &self,
        event_type: &str,
        owners: &HashSet<ScopeId>,
    ) -> usize {
        let removed = match self.listeners.get_mut(event_type) {
            Some(mut list) => {
                let before = list.len();
                list.retain(|l| !owners.contains(&l.owner));
                before - list.len()
            }
            None => 0,
        };
        self.listeners.remove_if(event_type, |_, list| list.is_empty());
        removed
    }

    pub(crate) fn clear_listeners_where(&self, pred: impl Fn(&str, ScopeId) -> bool) {
        self.listeners.retain(|event_type, list| {
            list.retain(|l| !pred(event_type, l.owner));
            !list.is_empty()
        });
    }

    pub(crate) fn register_initial_payload(&self, event_type: &str, producer: PayloadFn) {
        self.initial_payloads
            .insert(event_type.to_string(), producer);
    }

    pub(crate) fn initial_payload(&self, event_type: &str) -> Option<Payload> {
        let producer = self
            .initial_payloads
            .get(event_type)
            .map(|p| p.value().clone())?;
        Some(producer())
    }

    pub(crate) fn clear_initial_payloads_where(&self, pred: impl Fn(&str) -> bool) {
        self.initial_payloads
            .retain(|event_type, _| !pred(event_type));
    }

    pub(crate) fn publish<E: Event>(&self, payload: E) -> MessengerResult<()> {
        let payload: Payload = Arc::new(payload);
        self.publish_payload(E::TYPE, &payload)
    }

    fn publish_payload(&self, event_type: &str, payload: &Payload) -> MessengerResult<()> {
        // 先快照再迭代：监听器在回调中增删订阅不会影响本次派发
        let snapshot = self
            .listeners
            .get(event_type)
            .map(|l| l.value().clone())
            .unwrap_or_default();

        if self.config.trace_dispatch {
            trace!(
                event = event_type,
                listeners = snapshot.len(),
                "publishing event"
            );
        }

        let mut failures = Vec::new();
        for entry in snapshot {
            if let Err(error) = self.invoke(&entry, payload) {
                failures.push(ListenerFailure {
                    subscription: entry.id,
                    error,
                });
            }
        }

        if failures.is_empty() {
            return Ok(());
        }

        match self.config.listener_error_policy {
            ListenerErrorPolicy::Aggregate => {
                for failure in &failures {
                    warn!(event = event_type, subscription = %failure.subscription, error = %failure.error, "listener failed");
                }
                Err(MessengerError::AggregatedPublish {
                    event: event_type.to_string(),
                    failures,
                })
            }
            ListenerErrorPolicy::Report => {
                for failure in &failures {
                    error!(event = event_type, subscription = %failure.subscription, error = %failure.error, "listener failed");
                }
                Ok(())
            }
        }
    }

    fn invoke(&self, entry: &ListenerEntry, payload: &Payload) -> anyhow::Result<()> {
        if !self.config.catch_panics {
            return (entry.callback)(payload);
        }

        match panic::catch_unwind(AssertUnwindSafe(|| (entry.callback)(payload))) {
            Ok(result) => result,
            Err(panic) => Err(anyhow::anyhow!(
                "listener panicked: {}",
                panic_message(panic.as_ref())
            )),
        }
    }
}

/// 把类型化监听器包装为类型擦除的监听器
pub(crate) fn typed_listener<E, F>(listener: F) -> ListenerFn
where
    E: Event,
    F: Fn(&Arc<E>) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(move |payload: &Payload| {
        let payload = Arc::clone(payload).downcast::<E>().map_err(|_| {
            anyhow::anyhow!(
                "payload type mismatch: event={}, expected={}",
                E::TYPE,
                type_name::<E>()
            )
        })?;
        listener(&payload)
    })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
