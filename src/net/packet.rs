//! 数据包记录
//!
//! packet 的所有权在引擎的 arena 表里；VOQ 与事件队列只携带
//! `PacketId`。一个 packet 任一时刻至多出现在一个 VOQ 中。

use super::id::{FlowId, PacketId, RackId};
use crate::sim::SimTime;

/// 网络数据包。
///
/// 跳数不变量：
/// - `hop_count = 0`：仍在 `src_rack` 排队，未发送；
/// - `hop_count = 1`：已交付（`current_rack = final_dst`）或在中继机架等待第二跳；
/// - `hop_count = 2`：已交付。
///
/// `final_dst` 创建后不变；`current_dst` 只在选定下一跳时更新。
#[derive(Debug, Clone)]
pub struct Packet {
    pub id: PacketId,
    pub flow_id: FlowId,
    /// 起源机架（不变）
    pub src_rack: RackId,
    /// 最终目的机架（不变）
    pub final_dst: RackId,
    /// 当前持有（或正在发送）该 packet 的机架
    pub current_rack: RackId,
    /// 本次待发送的下一跳机架
    pub current_dst: RackId,
    pub size_bytes: u32,
    pub creation_time: SimTime,
    pub sent_time: SimTime,
    pub arrival_time: SimTime,
    pub hop_count: u8,
    pub dropped: bool,
}

impl Packet {
    pub fn new(
        id: PacketId,
        flow_id: FlowId,
        src_rack: RackId,
        final_dst: RackId,
        size_bytes: u32,
        creation_time: SimTime,
    ) -> Self {
        Self {
            id,
            flow_id,
            src_rack,
            final_dst,
            current_rack: src_rack,
            // 入队时由 VLB 决策改写
            current_dst: final_dst,
            size_bytes,
            creation_time,
            sent_time: SimTime::ZERO,
            arrival_time: SimTime::ZERO,
            hop_count: 0,
            dropped: false,
        }
    }
}
