//! 仿真引擎
//!
//! 事件驱动主循环与 RotorNet 发送策略的结合点。引擎独占全部可变
//! 状态（packet/flow arena、各机架 VOQ、busy 标志、事件堆），单线程
//! 推进仿真时间。
//!
//! 每个机架一条上行链路：空闲时从本机架 VOQ 中选包发送，仲裁规则
//! 固定为两轮升序扫描——先选有直连电路的 NONLOCAL（第二跳）目的，
//! 再选有直连电路的 LOCAL（第一跳）目的；都没有则保持空闲，等新包
//! 入队或唤醒事件再试。第一跳入队时由 VLB 策略决定直连还是经随机
//! 中继（两跳 Valiant 负载均衡）。

use std::collections::BTreeMap;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace, warn};

use super::event::{EventQueue, SimEvent};
use super::time::SimTime;
use crate::config::{ConfigError, SimConfig};
use crate::net::{Flow, FlowId, Packet, PacketId, RackId, RotorSchedule, VoqBank, VoqClass};
use crate::stats::Statistics;

/// RotorNet 离散事件仿真引擎。
pub struct Simulator {
    config: SimConfig,
    schedule: RotorSchedule,
    events: EventQueue,

    // arena：VOQ 与事件只携带 id
    flows: BTreeMap<FlowId, Flow>,
    packets: Vec<Packet>,

    voqs: Vec<VoqBank>,
    busy: Vec<bool>,
    next_free_time: Vec<SimTime>,
    /// 已调度未触发的唤醒时刻；更早的直连窗口出现时重新调度
    wakeup_at: Vec<Option<SimTime>>,

    now: SimTime,
    end_time: SimTime,
    total_bytes_transmitted: u64,
    dropped_packets: u64,

    // VLB 中继选择使用独立 RNG（种子 = random_seed + 1000），
    // 与负载生成互不干扰，二者共同构成可复现性约定
    rng: ChaCha8Rng,
}

impl Simulator {
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let schedule = RotorSchedule::new(&config);
        let num_racks = config.num_racks;
        let voqs = (0..num_racks)
            .map(|r| VoqBank::new(RackId(r), num_racks, config.queue_size_pkts))
            .collect();
        let rng = ChaCha8Rng::seed_from_u64(config.random_seed.wrapping_add(1000));
        let end_time = config.end_time();
        Ok(Self {
            config,
            schedule,
            events: EventQueue::default(),
            flows: BTreeMap::new(),
            packets: Vec::new(),
            voqs,
            busy: vec![false; num_racks],
            next_free_time: vec![SimTime::ZERO; num_racks],
            wakeup_at: vec![None; num_racks],
            now: SimTime::ZERO,
            end_time,
            total_bytes_transmitted: 0,
            dropped_packets: 0,
            rng,
        })
    }

    /// 注册一条流并调度其到达事件。
    pub fn add_flow(&mut self, flow: Flow) {
        debug_assert!(flow.src_rack != flow.dst_rack, "intra-rack flow");
        debug_assert!(flow.dst_rack.0 < self.config.num_racks, "dst rack out of range");
        let at = SimTime::from_millis_f64(flow.start_time_ms);
        self.events.schedule(at, SimEvent::FlowArrival(flow.id));
        self.flows.insert(flow.id, flow);
    }

    pub fn add_flows(&mut self, flows: impl IntoIterator<Item = Flow>) {
        for flow in flows {
            self.add_flow(flow);
        }
    }

    /// 运行直到事件堆耗尽或下一事件超出仿真结束时间。
    pub fn run(&mut self) {
        info!(flows = self.flows.len(), "▶️ 开始运行仿真");

        let mut event_count: u64 = 0;
        while let Some(at) = self.events.peek_time() {
            if at > self.end_time {
                info!(
                    next_event_us = at.as_micros_f64(),
                    end_us = self.end_time.as_micros_f64(),
                    "下一事件超出仿真结束时间，停止"
                );
                break;
            }
            let (at, ev) = self.events.pop().expect("peek then pop");
            self.now = at;
            event_count += 1;

            trace!(now = ?self.now, ev = ?ev, remaining = self.events.len(), "执行事件");
            match ev {
                SimEvent::FlowArrival(flow_id) => self.handle_flow_arrival(flow_id),
                SimEvent::PacketArrival(pid) => self.handle_packet_arrival(pid),
                SimEvent::TransmissionComplete(pid) => self.handle_transmission_complete(pid),
                SimEvent::RackWakeup(rack) => self.handle_rack_wakeup(rack),
            }
        }

        info!(
            total_events = event_count,
            final_time_ms = self.now.as_millis_f64(),
            dropped = self.dropped_packets,
            "✅ 仿真完成"
        );
    }

    /// 运行结束后汇总统计。
    pub fn statistics(&self) -> Statistics {
        let mut stats = Statistics::new(self.config.sim_time_ms);
        for flow in self.flows.values() {
            stats.add_flow(flow);
        }
        stats.set_dropped_packets(self.dropped_packets);
        let sim_time_s = self.config.sim_time_ms / 1000.0;
        stats.set_throughput_gbps(self.total_bytes_transmitted as f64 * 8.0 / (sim_time_s * 1e9));
        stats
    }

    // ---- 事件处理 ----

    /// 流到达：按 MTU 切包并在源机架入队。最后一个 packet 携带余量。
    fn handle_flow_arrival(&mut self, flow_id: FlowId) {
        let Some(flow) = self.flows.get(&flow_id) else {
            warn!(flow = flow_id.0, "未知流的到达事件");
            return;
        };
        let src_rack = flow.src_rack;
        let final_dst = flow.dst_rack;
        let num_packets = flow.num_packets(self.config.mtu_bytes);
        let mut remaining = flow.size_bytes;

        debug!(
            flow = flow_id.0,
            src = src_rack.0,
            dst = final_dst.0,
            bytes = remaining,
            packets = num_packets,
            "流到达"
        );

        let mut ids = Vec::with_capacity(num_packets);
        for _ in 0..num_packets {
            let pid = PacketId(self.packets.len() as u64);
            let size = remaining.min(u64::from(self.config.mtu_bytes)) as u32;
            remaining -= u64::from(size);
            self.packets
                .push(Packet::new(pid, flow_id, src_rack, final_dst, size, self.now));
            ids.push(pid);
        }
        self.flows
            .get_mut(&flow_id)
            .expect("flow exists")
            .packet_ids = ids.clone();

        for pid in ids {
            self.enqueue_at(pid, src_rack);
        }
    }

    /// 在 `rack` 处将 packet 入队（第一跳走 VLB 决策，第二跳进 NONLOCAL），
    /// 溢出则尾丢弃；机架空闲时立即尝试发送。
    fn enqueue_at(&mut self, pid: PacketId, rack: RackId) {
        let (hop_count, final_dst) = {
            let p = &self.packets[pid.index()];
            (p.hop_count, p.final_dst)
        };

        let (class, nexthop) = if hop_count == 1 {
            (VoqClass::Nonlocal, final_dst)
        } else {
            (VoqClass::Local, self.first_hop_target(rack, final_dst))
        };
        self.packets[pid.index()].current_dst = nexthop;

        match self.voqs[rack.0].enqueue(pid, nexthop, class) {
            Ok(()) => {
                trace!(
                    pkt = pid.0,
                    rack = rack.0,
                    nexthop = nexthop.0,
                    class = ?class,
                    depth = self.voqs[rack.0].queue_size(nexthop, class),
                    "packet 入队"
                );
                if !self.busy[rack.0] {
                    self.start_transmission(rack);
                }
            }
            Err(pid) => self.drop_packet(pid, rack),
        }
    }

    /// VLB 第一跳决策：一个时隙内有直连就直发；直连队列拥塞才走随机
    /// 中继；其余情况默认直发。
    fn first_hop_target(&mut self, rack: RackId, final_dst: RackId) -> RackId {
        let wait = self
            .schedule
            .next_direct_path_time(rack, final_dst, self.now)
            .saturating_sub(self.now);
        if wait < self.schedule.slot_time() {
            return final_dst;
        }
        let depth = self.voqs[rack.0].queue_size(final_dst, VoqClass::Local);
        if depth > self.config.queue_threshold {
            let via = self.select_intermediate(rack, final_dst);
            debug!(
                rack = rack.0,
                dst = final_dst.0,
                via = via.0,
                depth,
                wait_us = wait.as_micros_f64(),
                "直连队列拥塞，VLB 选择中继"
            );
            return via;
        }
        final_dst
    }

    /// 从 racks \ {src, dst} 中均匀随机选中继。
    fn select_intermediate(&mut self, src: RackId, dst: RackId) -> RackId {
        if self.config.num_racks <= 2 {
            return dst;
        }
        loop {
            let r = RackId(self.rng.gen_range(0..self.config.num_racks));
            if r != src && r != dst {
                return r;
            }
        }
    }

    /// 为 `rack` 仲裁选出一个可发送的 packet 并调度其发送完成事件。
    fn start_transmission(&mut self, rack: RackId) {
        let bank = &self.voqs[rack.0];
        if bank.is_empty() {
            self.busy[rack.0] = false;
            return;
        }

        // 仲裁：NONLOCAL 直连优先于 LOCAL 直连，均按机架号升序首中即选
        let mut selected = None;
        'scan: for class in [VoqClass::Nonlocal, VoqClass::Local] {
            for dst in bank.nonempty_destinations(class) {
                if self.schedule.has_direct_path(rack, dst, self.now) {
                    selected = Some((dst, class));
                    break 'scan;
                }
            }
        }

        let Some((dst, class)) = selected else {
            // 当前没有任何已排队目的的直连电路；等待新包或唤醒
            self.busy[rack.0] = false;
            self.maybe_schedule_wakeup(rack);
            return;
        };

        let pid = self.voqs[rack.0]
            .dequeue(dst, class)
            .expect("nonempty VOQ after scan");
        self.busy[rack.0] = true;

        let size = self.packets[pid.index()].size_bytes;
        let tx_time = self.config.tx_time(size);
        self.packets[pid.index()].sent_time = self.now;
        let done = self.now.saturating_add(tx_time);

        trace!(
            rack = rack.0,
            pkt = pid.0,
            dst = dst.0,
            class = ?class,
            bytes = size,
            tx_us = tx_time.as_micros_f64(),
            "开始发送"
        );
        self.events.schedule(done, SimEvent::TransmissionComplete(pid));
    }

    /// 机架空闲但仍有包排队时，在最早的直连可用时刻调度唤醒。已有
    /// 更早的唤醒在排队时不重复调度；出现更早窗口则补一个（旧事件
    /// 触发时机架多半已空闲完毕，当作无害的多余唤醒）。
    fn maybe_schedule_wakeup(&mut self, rack: RackId) {
        if !self.config.slot_wakeup {
            return;
        }
        let bank = &self.voqs[rack.0];
        if bank.is_empty() {
            return;
        }
        let mut earliest: Option<SimTime> = None;
        for class in [VoqClass::Nonlocal, VoqClass::Local] {
            for dst in bank.nonempty_destinations(class) {
                let t = self.schedule.next_direct_path_time(rack, dst, self.now);
                earliest = Some(earliest.map_or(t, |e| e.min(t)));
            }
        }
        let Some(at) = earliest else { return };
        if self.wakeup_at[rack.0].is_some_and(|cur| cur <= at) {
            return;
        }
        self.wakeup_at[rack.0] = Some(at);
        trace!(rack = rack.0, at_us = at.as_micros_f64(), "调度唤醒事件");
        self.events.schedule(at, SimEvent::RackWakeup(rack));
    }

    fn handle_rack_wakeup(&mut self, rack: RackId) {
        self.wakeup_at[rack.0] = None;
        if !self.busy[rack.0] {
            self.start_transmission(rack);
        }
    }

    /// 发送完成：交付或转发，然后继续泵发送机架的下一个 packet。
    fn handle_transmission_complete(&mut self, pid: PacketId) {
        let (tx_rack, next_rack, final_dst, size, flow_id) = {
            let p = &self.packets[pid.index()];
            (p.current_rack, p.current_dst, p.final_dst, p.size_bytes, p.flow_id)
        };
        self.packets[pid.index()].hop_count += 1;
        let arrival = self.now.saturating_add(self.config.propagation_delay());

        if next_rack == final_dst {
            // 到达最终目的
            {
                let p = &mut self.packets[pid.index()];
                p.arrival_time = arrival;
                p.current_rack = next_rack;
            }
            self.total_bytes_transmitted += u64::from(size);

            let flow = self.flows.get_mut(&flow_id).expect("flow exists");
            flow.packets_received += 1;
            if flow.packets_received == flow.packet_ids.len() {
                flow.completed = true;
                flow.completion_time_ms = arrival.as_millis_f64();
                debug!(
                    flow = flow_id.0,
                    fct_ms = flow.fct_ms().unwrap_or(0.0),
                    "流完成"
                );
            }
        } else {
            // 到达中继机架，准备第二跳
            {
                let p = &mut self.packets[pid.index()];
                p.current_rack = next_rack;
                p.current_dst = final_dst;
            }
            if arrival <= self.end_time {
                self.events.schedule(arrival, SimEvent::PacketArrival(pid));
            } else {
                info!(
                    pkt = pid.0,
                    flow = flow_id.0,
                    rack = next_rack.0,
                    arrival_us = arrival.as_micros_f64(),
                    "到达时间超出仿真结束时间，不再投递"
                );
            }
        }

        // 发送机架空出，继续发下一个
        self.next_free_time[tx_rack.0] = self.now;
        self.start_transmission(tx_rack);
    }

    /// packet 经第一跳抵达中继机架：进该机架的 NONLOCAL VOQ。
    fn handle_packet_arrival(&mut self, pid: PacketId) {
        let rack = self.packets[pid.index()].current_rack;
        debug_assert_eq!(self.packets[pid.index()].hop_count, 1);
        debug_assert_ne!(rack, self.packets[pid.index()].final_dst);
        self.enqueue_at(pid, rack);
    }

    fn drop_packet(&mut self, pid: PacketId, rack: RackId) {
        let p = &mut self.packets[pid.index()];
        p.dropped = true;
        self.dropped_packets += 1;
        debug!(
            pkt = pid.0,
            flow = p.flow_id.0,
            rack = rack.0,
            hop = p.hop_count,
            "VOQ 溢出，尾丢弃"
        );
    }

    // ---- 只读访问（统计与测试用） ----

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn schedule(&self) -> &RotorSchedule {
        &self.schedule
    }

    pub fn flows(&self) -> &BTreeMap<FlowId, Flow> {
        &self.flows
    }

    pub fn packets(&self) -> &[Packet] {
        &self.packets
    }

    pub fn voq(&self, rack: RackId) -> &VoqBank {
        &self.voqs[rack.0]
    }

    /// 机架上一次发送结束的时刻。
    pub fn next_free_time(&self, rack: RackId) -> SimTime {
        self.next_free_time[rack.0]
    }

    pub fn dropped_packets(&self) -> u64 {
        self.dropped_packets
    }

    pub fn total_bytes_transmitted(&self) -> u64 {
        self.total_bytes_transmitted
    }
}
