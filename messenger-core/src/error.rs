//! 消息总线统一错误定义
//!
//! 所有错误都在调用点同步返回，总线从不吞掉它们；
//! 调用方应将其视为契约违例（编程错误），而非可重试的运行时状况。
//!
use crate::registry::SubscriptionId;
use std::fmt;
use thiserror::Error;

/// 统一错误类型
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum MessengerError {
    // --- 注册 ---
    #[error("handler already registered: action={action}")]
    DuplicateHandler { action: String },
    #[error("namespace violation: namespace={namespace}, type={message_type}")]
    NamespaceViolation {
        namespace: String,
        message_type: String,
    },
    #[error("invalid namespace: {namespace}")]
    InvalidNamespace { namespace: String },

    // --- 调用/订阅 ---
    #[error("action not found: {action}")]
    ActionNotFound { action: String },
    #[error("restriction violation: messenger={messenger}, type={message_type}")]
    RestrictionViolation {
        messenger: String,
        message_type: String,
    },
    #[error("listener not found: event={event}, subscription={subscription}")]
    ListenerNotFound {
        event: String,
        subscription: SubscriptionId,
    },
    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    // --- 发布 ---
    #[error("publish failed: event={event}, failures={}", .failures.len())]
    AggregatedPublish {
        event: String,
        failures: Vec<ListenerFailure>,
    },

    // --- 委托 ---
    #[error("delegation error: {reason}")]
    Delegation { reason: String },
}

impl MessengerError {
    pub(crate) fn namespace_violation(namespace: &str, message_type: &str) -> Self {
        Self::NamespaceViolation {
            namespace: namespace.to_string(),
            message_type: message_type.to_string(),
        }
    }

    pub(crate) fn restriction_violation(messenger: &str, message_type: &str) -> Self {
        Self::RestrictionViolation {
            messenger: messenger.to_string(),
            message_type: message_type.to_string(),
        }
    }

    pub(crate) fn delegation(reason: impl Into<String>) -> Self {
        Self::Delegation {
            reason: reason.into(),
        }
    }
}

/// 统一 Result 类型别名
pub type MessengerResult<T> = Result<T, MessengerError>;

/// 单个监听器在一次发布中的失败记录
#[derive(Debug)]
pub struct ListenerFailure {
    pub subscription: SubscriptionId,
    pub error: anyhow::Error,
}

impl fmt::Display for ListenerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:#}", self.subscription, self.error)
    }
}
