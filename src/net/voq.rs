//! 虚拟输出队列（VOQ）
//!
//! 每个机架维护两类按目的机架划分的有界 FIFO：
//! - `local`：本机架起源的 packet（第一跳，目的可能是最终目的或中继）；
//! - `nonlocal`：作为中继收到的 packet（第二跳，目的必为最终目的）。
//!
//! 容量不足时尾丢弃：队头永不被挤出，新到的 packet 被退回。
//! `BTreeMap` 保证按机架号升序遍历，调度仲裁直接复用这一顺序。

use std::collections::{BTreeMap, VecDeque};

use super::id::{PacketId, RackId};

/// VOQ 类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoqClass {
    Local,
    Nonlocal,
}

/// 单个机架的 VOQ 组。
#[derive(Debug)]
pub struct VoqBank {
    rack: RackId,
    capacity: usize,
    local: BTreeMap<RackId, VecDeque<PacketId>>,
    nonlocal: BTreeMap<RackId, VecDeque<PacketId>>,
    total: usize,
}

impl VoqBank {
    pub fn new(rack: RackId, num_racks: usize, capacity: usize) -> Self {
        let mut local = BTreeMap::new();
        let mut nonlocal = BTreeMap::new();
        for r in 0..num_racks {
            let dst = RackId(r);
            if dst != rack {
                local.insert(dst, VecDeque::new());
                nonlocal.insert(dst, VecDeque::new());
            }
        }
        Self {
            rack,
            capacity,
            local,
            nonlocal,
            total: 0,
        }
    }

    pub fn rack(&self) -> RackId {
        self.rack
    }

    fn queues(&self, class: VoqClass) -> &BTreeMap<RackId, VecDeque<PacketId>> {
        match class {
            VoqClass::Local => &self.local,
            VoqClass::Nonlocal => &self.nonlocal,
        }
    }

    fn queues_mut(&mut self, class: VoqClass) -> &mut BTreeMap<RackId, VecDeque<PacketId>> {
        match class {
            VoqClass::Local => &mut self.local,
            VoqClass::Nonlocal => &mut self.nonlocal,
        }
    }

    /// 入队：成功返回 Ok；目的非法或队列已满则退回 packet。
    pub fn enqueue(
        &mut self,
        pkt: PacketId,
        nexthop: RackId,
        class: VoqClass,
    ) -> Result<(), PacketId> {
        if nexthop == self.rack {
            return Err(pkt);
        }
        let capacity = self.capacity;
        let Some(q) = self.queues_mut(class).get_mut(&nexthop) else {
            return Err(pkt);
        };
        if q.len() >= capacity {
            return Err(pkt);
        }
        q.push_back(pkt);
        self.total += 1;
        Ok(())
    }

    /// 出队：按 FIFO 返回指定目的队列的队头。
    pub fn dequeue(&mut self, nexthop: RackId, class: VoqClass) -> Option<PacketId> {
        let pkt = self.queues_mut(class).get_mut(&nexthop)?.pop_front()?;
        self.total -= 1;
        Some(pkt)
    }

    pub fn has_packets(&self, nexthop: RackId, class: VoqClass) -> bool {
        self.queues(class)
            .get(&nexthop)
            .is_some_and(|q| !q.is_empty())
    }

    pub fn queue_size(&self, nexthop: RackId, class: VoqClass) -> usize {
        self.queues(class).get(&nexthop).map_or(0, |q| q.len())
    }

    /// 非空队列的目的机架，按机架号升序。
    pub fn nonempty_destinations(&self, class: VoqClass) -> Vec<RackId> {
        self.queues(class)
            .iter()
            .filter(|(_, q)| !q.is_empty())
            .map(|(dst, _)| *dst)
            .collect()
    }

    pub fn total_packets(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}
