//! 基于消息总线的状态控制器基础设施
//!
//! 约定每个控制器：
//! - 以自己的名字作为命名空间；
//! - 注册 `<Name>:getState` 动作返回当前状态；
//! - 状态变化时发布 `<Name>:stateChange` 事件，载荷为 `(state, previous)`。
//!
pub mod base_controller;
pub mod controller;
pub mod error;

pub use base_controller::BaseController;
pub use controller::{Controller, GetState, StateChange};
pub use error::{ControllerError, ControllerResult};

extern crate self as messenger_controller;
