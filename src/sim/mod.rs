//! 仿真核心模块
//!
//! 此模块包含事件驱动仿真的核心组件：仿真时间、事件队列与仿真引擎。

// 子模块声明
mod engine;
mod event;
mod time;

// 重新导出公共接口
pub use engine::Simulator;
pub use event::{EventQueue, ScheduledEvent, SimEvent};
pub use time::SimTime;
