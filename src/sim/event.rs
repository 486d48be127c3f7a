//! 事件队列
//!
//! 定义离散事件类型及按时间排序的最小堆。同一时刻的事件按
//! 插入序号先后执行，保证同种子运行逐位可复现。

use super::time::SimTime;
use crate::net::{FlowId, PacketId, RackId};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// 仿真事件。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    /// 流到达：按 MTU 切分为 packet 并入源机架 VOQ
    FlowArrival(FlowId),
    /// packet 经第一跳到达中继机架
    PacketArrival(PacketId),
    /// 一次链路发送完成
    TransmissionComplete(PacketId),
    /// 唤醒空闲机架，重试发送（匹配切换时刻）
    RackWakeup(RackId),
}

/// 调度事件，包含执行时间、序列号和事件内容。
#[derive(Debug, Clone, Copy)]
pub struct ScheduledEvent {
    pub(crate) at: SimTime,
    pub(crate) seq: u64,
    pub(crate) ev: SimEvent,
}

// BinaryHeap 是 max-heap；我们需要最小时间优先，因此反向比较。
impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.at.cmp(&other.at) {
            Ordering::Equal => self.seq.cmp(&other.seq),
            ord => ord,
        }
        .reverse()
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.seq == other.seq
    }
}

impl Eq for ScheduledEvent {}

/// 事件队列：维护待执行事件与插入序号。
#[derive(Debug, Default)]
pub struct EventQueue {
    next_seq: u64,
    q: BinaryHeap<ScheduledEvent>,
}

impl EventQueue {
    /// 调度事件在指定时间执行
    pub fn schedule(&mut self, at: SimTime, ev: SimEvent) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.q.push(ScheduledEvent { at, seq, ev });
    }

    /// 下一个事件的时间（不出队）
    pub fn peek_time(&self) -> Option<SimTime> {
        self.q.peek().map(|e| e.at)
    }

    /// 取出时间最小的事件
    pub fn pop(&mut self) -> Option<(SimTime, SimEvent)> {
        self.q.pop().map(|e| (e.at, e.ev))
    }

    pub fn len(&self) -> usize {
        self.q.len()
    }

    pub fn is_empty(&self) -> bool {
        self.q.is_empty()
    }
}
