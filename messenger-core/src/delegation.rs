//! 能力委托（Delegation）
//!
//! 父节点可以把自己有权访问的动作/事件委托给直接子节点；
//! 子节点再委托给自己的子节点即形成多级委托。撤销时沿子树向下级联，
//! 被撤销事件的既有监听器一并移除。
//!
use crate::error::{MessengerError, MessengerResult};
use crate::messenger::{Messenger, Scope};
use crate::registry::ScopeId;
use bon::Builder;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// 委托/撤销参数
#[derive(Builder)]
pub struct DelegateOptions {
    /// 目标子节点，必须是当前节点的直接子节点
    messenger: Messenger,
    #[builder(default)]
    actions: Vec<String>,
    #[builder(default)]
    events: Vec<String>,
}

impl Messenger {
    /// 将动作/事件委托给直接子节点
    ///
    /// 当前节点必须自己有权访问每一个被委托的类型，否则整体失败，不做部分委托。
    pub fn delegate(&self, options: DelegateOptions) -> MessengerResult<()> {
        let DelegateOptions {
            messenger: child,
            actions,
            events,
        } = options;
        self.ensure_direct_child(&child)?;

        if let Some(action) = actions.iter().find(|a| !self.scope.can_call(a)) {
            return Err(MessengerError::restriction_violation(self.label(), action));
        }
        if let Some(event) = events.iter().find(|e| !self.scope.can_subscribe(e)) {
            return Err(MessengerError::restriction_violation(self.label(), event));
        }

        child
            .scope
            .delegated_actions
            .write()
            .extend(actions.iter().cloned());
        child
            .scope
            .delegated_events
            .write()
            .extend(events.iter().cloned());

        debug!(
            parent = self.label(),
            child = child.label(),
            ?actions,
            ?events,
            "delegated capabilities"
        );
        Ok(())
    }

    /// 撤销此前的委托，并沿子树级联
    ///
    /// 对于被撤销的事件，失去访问权的节点上已注册的监听器会被移除。
    pub fn revoke(&self, options: DelegateOptions) -> MessengerResult<()> {
        let DelegateOptions {
            messenger: child,
            actions,
            events,
        } = options;
        self.ensure_direct_child(&child)?;

        for action in &actions {
            revoke_action(&child.scope, action);
        }

        let mut removed = 0;
        for event in &events {
            let mut affected = HashSet::new();
            revoke_event(&child.scope, event, &mut affected);
            removed += self.registry.remove_listeners_owned_by(event, &affected);
        }

        debug!(
            parent = self.label(),
            child = child.label(),
            ?actions,
            ?events,
            removed_listeners = removed,
            "revoked capabilities"
        );
        Ok(())
    }

    fn ensure_direct_child(&self, child: &Messenger) -> MessengerResult<()> {
        let is_direct_child = child
            .scope
            .parent
            .as_ref()
            .is_some_and(|parent| std::ptr::eq(parent.as_ptr(), Arc::as_ptr(&self.scope)));
        if is_direct_child {
            return Ok(());
        }
        Err(MessengerError::delegation(format!(
            "{} is not a direct child of {}",
            child.label(),
            self.label()
        )))
    }
}

fn revoke_action(scope: &Arc<Scope>, action: &str) {
    let removed = scope.delegated_actions.write().remove(action);
    // 仍可通过自身或后代命名空间访问时，下游的委托不受影响
    if !removed || scope.can_call(action) {
        return;
    }
    for child in scope.children() {
        revoke_action(&child, action);
    }
}

fn revoke_event(scope: &Arc<Scope>, event: &str, affected: &mut HashSet<ScopeId>) {
    let removed = scope.delegated_events.write().remove(event);
    if !removed || scope.can_subscribe(event) {
        return;
    }
    affected.insert(scope.id);
    for child in scope.children() {
        revoke_event(&child, event, affected);
    }
}
