//! 总线配置
//!
//! 可嵌入应用配置文件（`#[serde(default)]`，缺省字段取默认值）。
//!
use serde::{Deserialize, Serialize};

/// 监听器失败时 `publish` 的行为
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListenerErrorPolicy {
    /// 隔离失败，继续通知其余监听器，结束后返回 `AggregatedPublish`
    #[default]
    Aggregate,
    /// 隔离失败并以 `error` 级别记录日志，`publish` 本身返回成功
    Report,
}

/// 总线配置
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessengerConfig {
    /// 监听器失败策略
    pub listener_error_policy: ListenerErrorPolicy,
    /// 是否把监听器 panic 视为失败（而非向发布者传播）
    pub catch_panics: bool,
    /// 逐条记录 call/publish 派发（trace 级别）
    pub trace_dispatch: bool,
}

impl Default for MessengerConfig {
    fn default() -> Self {
        Self {
            listener_error_policy: ListenerErrorPolicy::Aggregate,
            catch_panics: true,
            trace_dispatch: false,
        }
    }
}
