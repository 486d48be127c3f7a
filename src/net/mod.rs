//! 网络实体模块
//!
//! 此模块包含 rotor 网络的实体与查询组件：标识符、流、数据包、
//! 虚拟输出队列与 rotor 匹配调度表。

// 子模块声明
mod flow;
mod id;
mod packet;
mod schedule;
mod voq;

// 重新导出公共接口
pub use flow::{Flow, FlowKind};
pub use id::{FlowId, PacketId, RackId, SwitchId};
pub use packet::Packet;
pub use schedule::RotorSchedule;
pub use voq::{VoqBank, VoqClass};

#[cfg(test)]
pub(crate) use schedule::rounds_for_test;
