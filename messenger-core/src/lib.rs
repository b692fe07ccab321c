//! 进程内消息总线基础库（messenger-core）
//!
//! 为应用内各模块提供“只依赖名字、不持有彼此引用”的协作方式：
//! - 动作（`Action`）：请求/响应式调用，每个类型只允许一个处理器；
//! - 事件（`Event`）：广播式通知，可有任意多个监听器，按注册顺序派发；
//! - 受限视图（`RestrictedMessenger`）：以白名单约束模块可调用的动作与可订阅的事件，
//!   并要求模块只能在自己的命名空间下注册动作、发布事件；
//! - 委托（`Messenger::delegate`）：父总线把已有能力转交给子总线，不转移所有权；
//! - 选择器（`Selector`）：从事件载荷派生切片，仅在切片变化时通知监听器。
//!
//! 类型字符串形如 `"<Namespace>:<Verb>"`，区分大小写，命名空间须与声明模块的名字一致。
//!
//! 典型用法：
//! 1. 使用 `#[action]` / `#[event]`（见 `messenger-macros`）声明消息描述类型；
//! 2. 进程启动时创建唯一的 `Messenger::root()`；
//! 3. 为每个模块构造受限视图或子总线，并在构造函数中注入；
//! 4. 模块通过 `MessageBus` 注册自己拥有的动作，调用/订阅白名单内的能力。
//!
pub mod bus;
pub mod config;
pub mod delegation;
pub mod error;
pub mod message;
pub mod messenger;
mod registry;
pub mod restricted;
pub mod selector;
#[cfg(feature = "stream")]
pub mod stream;

pub use bus::MessageBus;
pub use config::{ListenerErrorPolicy, MessengerConfig};
pub use delegation::DelegateOptions;
pub use error::{ListenerFailure, MessengerError, MessengerResult};
pub use message::{Action, ActionHandler, Event};
pub use messenger::Messenger;
pub use registry::SubscriptionId;
pub use restricted::{RestrictedMessenger, RestrictedOptions};
pub use selector::Selector;
#[cfg(feature = "stream")]
pub use stream::SubscribeStreamExt;

// 允许在本 crate 内部通过 ::messenger_core 进行自引用，
// 以便过程宏在本 crate 的单元测试中也能解析到 ::messenger_core 路径。
extern crate self as messenger_core;
