//! 消息描述（Action / Event）与类型字符串约定
//!
//! 每个动作/事件由一个 Rust 类型描述，并通过关联常量 `TYPE` 给出稳定的类型字符串
//! `"<Namespace>:<Verb>"`。类型字符串是总线唯一对外的“协议”，用于路由、白名单与日志。
//!

/// 动作（请求/响应）描述
///
/// - 实现类型本身承载调用参数；
/// - `Output` 为处理器返回值，可以是普通值，也可以是 future，总线不会代为等待；
/// - `TYPE` 建议使用常量字符串，不随重构变化。
pub trait Action: Send + 'static {
    /// 动作类型字符串，形如 `AccountsController:getSelectedAccount`
    const TYPE: &'static str;

    /// 处理器返回值
    type Output: Send + 'static;
}

/// 事件（广播）描述，实现类型本身即为事件载荷
pub trait Event: Send + Sync + 'static {
    /// 事件类型字符串，形如 `AccountsController:stateChange`
    const TYPE: &'static str;
}

/// 动作处理器
///
/// 闭包 `Fn(A) -> A::Output` 自动实现该 trait。
pub trait ActionHandler<A: Action>: Send + Sync + 'static {
    fn handle(&self, action: A) -> A::Output;
}

impl<A, F> ActionHandler<A> for F
where
    A: Action,
    F: Fn(A) -> A::Output + Send + Sync + 'static,
{
    fn handle(&self, action: A) -> A::Output {
        self(action)
    }
}

/// 取出类型字符串的命名空间部分；格式不合法时返回 `None`
pub fn namespace_of(message_type: &str) -> Option<&str> {
    let (namespace, verb) = message_type.split_once(':')?;
    if namespace.is_empty() || verb.is_empty() {
        return None;
    }
    Some(namespace)
}

/// 类型字符串是否位于给定命名空间下（即以 `namespace + ":"` 开头且动词非空）
pub fn is_in_namespace(message_type: &str, namespace: &str) -> bool {
    namespace_of(message_type) == Some(namespace)
}

/// 命名空间必须非空且不含 `:`
pub(crate) fn is_valid_namespace(namespace: &str) -> bool {
    !namespace.is_empty() && !namespace.contains(':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_is_prefix_before_first_colon() {
        assert_eq!(namespace_of("A:getValue"), Some("A"));
        assert_eq!(namespace_of("A:b:c"), Some("A"));
        assert_eq!(namespace_of("getValue"), None);
        assert_eq!(namespace_of(":getValue"), None);
        assert_eq!(namespace_of("A:"), None);
    }

    #[test]
    fn namespace_membership_requires_separator() {
        assert!(is_in_namespace("A:getValue", "A"));
        assert!(!is_in_namespace("AB:getValue", "A"));
        assert!(!is_in_namespace("a:getValue", "A"));
        assert!(!is_in_namespace("A", "A"));
        assert!(!is_in_namespace("A:", "A"));
        assert!(is_in_namespace("A:b:c", "A"));
    }

    #[test]
    fn namespace_validation() {
        assert!(is_valid_namespace("KeyringController"));
        assert!(!is_valid_namespace(""));
        assert!(!is_valid_namespace("Keyring:Controller"));
    }
}
