//! rotor 调度表
//!
//! rotor 交换机的匹配序列完全确定、与仿真状态无关，因此建成一张
//! 静态表供查询：`matchings[switch][matching_index][rack] = 对端机架`。
//! 时间到（匹配序号, 时隙相位）的映射见 `connected_rack`；时隙开头的
//! `reconfig_delay` 为重构死区，链路不可用，以此刻画占空比开销。

use tracing::info;

use super::id::{RackId, SwitchId};
use crate::config::SimConfig;
use crate::sim::SimTime;

/// rotor 匹配调度表。
#[derive(Debug)]
pub struct RotorSchedule {
    num_racks: usize,
    num_matchings: usize,
    slot_ns: u64,
    cycle_ns: u64,
    reconfig_ns: u64,
    /// matchings[switch][matching_index][rack] = 对端；None 表示该时隙此机架空闲
    matchings: Vec<Vec<Vec<Option<RackId>>>>,
}

impl RotorSchedule {
    pub fn new(config: &SimConfig) -> Self {
        let rounds = round_robin_rounds(config.num_racks);
        let num_switches = config.num_switches;

        // 轮次按 round-robin 发给各交换机（C++ 拓扑的分配方式）
        let mut matchings: Vec<Vec<Vec<Option<RackId>>>> = vec![Vec::new(); num_switches];
        for (m, round) in rounds.iter().enumerate() {
            matchings[m % num_switches].push(round.clone());
        }

        let sched = Self {
            num_racks: config.num_racks,
            num_matchings: config.num_matchings(),
            slot_ns: config.slot_time().0,
            cycle_ns: config.cycle_time().0,
            reconfig_ns: SimTime::from_micros_f64(config.reconfig_delay_us).0,
            matchings,
        };

        info!(
            racks = sched.num_racks,
            switches = num_switches,
            matchings_per_switch = sched.num_matchings,
            slot_us = sched.slot_ns as f64 / 1_000.0,
            cycle_us = sched.cycle_ns as f64 / 1_000.0,
            "拓扑初始化完成"
        );

        sched
    }

    pub fn num_matchings(&self) -> usize {
        self.num_matchings
    }

    pub fn slot_time(&self) -> SimTime {
        SimTime(self.slot_ns)
    }

    pub fn cycle_time(&self) -> SimTime {
        SimTime(self.cycle_ns)
    }

    /// 时刻 `t` 在周期内对应的匹配序号。
    fn matching_index_at(&self, t: SimTime) -> usize {
        let t_cyc = t.0 % self.cycle_ns;
        ((t_cyc / self.slot_ns) as usize) % self.num_matchings
    }

    /// 时刻 `t` 处于时隙内的相位（0 起算）。
    fn phase_at(&self, t: SimTime) -> u64 {
        (t.0 % self.cycle_ns) % self.slot_ns
    }

    /// `src` 在 `switch` 上于时刻 `t` 的对端机架；重构死区或该时隙
    /// 无匹配（交换机分到的轮次不足、奇数机架的空轮）时返回 None。
    pub fn connected_rack(&self, src: RackId, switch: SwitchId, t: SimTime) -> Option<RackId> {
        if self.phase_at(t) < self.reconfig_ns {
            return None;
        }
        let idx = self.matching_index_at(t);
        self.matchings
            .get(switch.0)?
            .get(idx)?
            .get(src.0)
            .copied()
            .flatten()
    }

    /// 时刻 `t` 是否存在 src→dst 的直连电路。
    pub fn has_direct_path(&self, src: RackId, dst: RackId, t: SimTime) -> bool {
        (0..self.matchings.len()).any(|s| self.connected_rack(src, SwitchId(s), t) == Some(dst))
    }

    /// 匹配序号 `idx` 下是否有交换机把 src 连到 dst（不考虑相位）。
    fn index_connects(&self, src: RackId, dst: RackId, idx: usize) -> bool {
        self.matchings.iter().any(|per_switch| {
            per_switch
                .get(idx)
                .and_then(|m| m.get(src.0).copied().flatten())
                == Some(dst)
        })
    }

    /// 下一个 src→dst 直连可用的时刻（≥ t）。
    ///
    /// 从当前时隙起逐个检查接下来 `num_matchings` 个时隙窗口；命中的
    /// 窗口内取活跃相位的起点（或 t 本身，若此刻已在活跃相位）。
    /// 合法机架对必在一个周期内命中；兜底返回 `t + cycle`。
    pub fn next_direct_path_time(&self, src: RackId, dst: RackId, t: SimTime) -> SimTime {
        if src == dst {
            return SimTime(t.0.saturating_add(self.cycle_ns));
        }
        let slot_start = t.0 - self.phase_at(t);
        for k in 0..self.num_matchings as u64 {
            let s = slot_start.saturating_add(k.saturating_mul(self.slot_ns));
            let idx = (((s % self.cycle_ns) / self.slot_ns) as usize) % self.num_matchings;
            if self.index_connects(src, dst, idx) {
                return SimTime(t.0.max(s.saturating_add(self.reconfig_ns)));
            }
        }
        SimTime(t.0.saturating_add(self.cycle_ns))
    }
}

/// 经典循环法（round-robin tournament）生成的全部轮次。
///
/// 偶数 R：R−1 个完美匹配，两两不相交，并集覆盖所有机架对。
/// 奇数 R：引入幻影席位跑 R+1 的循环法，共 R 轮，每轮与幻影配对的
/// 机架该时隙空闲（None）。
fn round_robin_rounds(num_racks: usize) -> Vec<Vec<Option<RackId>>> {
    let seats = if num_racks % 2 == 0 {
        num_racks
    } else {
        num_racks + 1
    };
    let rot = seats - 1;
    let mut rounds = Vec::with_capacity(rot);

    for m in 0..rot {
        let mut round: Vec<Option<RackId>> = vec![None; num_racks];
        let mut pair = |a: usize, b: usize| {
            // 幻影席位（seats-1 == num_racks，仅奇数时存在）保持 None
            if a < num_racks && b < num_racks {
                round[a] = Some(RackId(b));
                round[b] = Some(RackId(a));
            }
        };
        // 固定席位 seats-1，其余席位轮转
        pair(seats - 1, m);
        for i in 1..seats / 2 {
            pair((m + i) % rot, (m + rot - i) % rot);
        }
        rounds.push(round);
    }

    rounds
}

#[cfg(test)]
pub(crate) fn rounds_for_test(num_racks: usize) -> Vec<Vec<Option<RackId>>> {
    round_robin_rounds(num_racks)
}
