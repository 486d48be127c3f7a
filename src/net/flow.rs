//! 流记录
//!
//! 流由负载生成器创建一次，仿真期间只由引擎在产生/交付 packet 时
//! 修改计数，运行结束后交给统计模块。

use super::id::{FlowId, PacketId, RackId};

/// 流类别。本仿真范围内全部流量按 bulk 处理；`LowLatency` 仅为
/// 流 CSV 格式的往返保留，不会进入发送路径。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    Bulk,
    LowLatency,
}

impl FlowKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FlowKind::Bulk => "bulk",
            FlowKind::LowLatency => "low_latency",
        }
    }

    pub fn parse(s: &str) -> Option<FlowKind> {
        match s {
            "bulk" => Some(FlowKind::Bulk),
            "low_latency" => Some(FlowKind::LowLatency),
            _ => None,
        }
    }
}

/// 一条主机到主机的流。
#[derive(Debug, Clone)]
pub struct Flow {
    pub id: FlowId,
    pub src_rack: RackId,
    pub dst_rack: RackId,
    pub src_host: usize,
    pub dst_host: usize,
    pub size_bytes: u64,
    /// 到达时间（毫秒）
    pub start_time_ms: f64,
    pub kind: FlowKind,

    pub packet_ids: Vec<PacketId>,
    pub packets_received: usize,
    pub completed: bool,
    /// 最后一个 packet 的交付时间（毫秒）
    pub completion_time_ms: f64,
}

impl Flow {
    pub fn new(
        id: FlowId,
        src_rack: RackId,
        dst_rack: RackId,
        src_host: usize,
        dst_host: usize,
        size_bytes: u64,
        start_time_ms: f64,
        kind: FlowKind,
    ) -> Self {
        Self {
            id,
            src_rack,
            dst_rack,
            src_host,
            dst_host,
            size_bytes,
            start_time_ms,
            kind,
            packet_ids: Vec::new(),
            packets_received: 0,
            completed: false,
            completion_time_ms: 0.0,
        }
    }

    /// 流完成时间（毫秒）；未完成的流返回 None。
    pub fn fct_ms(&self) -> Option<f64> {
        if !self.completed {
            return None;
        }
        Some(self.completion_time_ms - self.start_time_ms)
    }

    /// 按 MTU 切分所需的 packet 数（⌈size/MTU⌉）。
    pub fn num_packets(&self, mtu_bytes: u32) -> usize {
        let mtu = u64::from(mtu_bytes.max(1));
        self.size_bytes.div_ceil(mtu) as usize
    }
}
