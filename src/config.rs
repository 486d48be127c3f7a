//! 运行配置
//!
//! 文本配置为每行一对 `key value`（空白分隔），未知键忽略。
//! 配置在一次运行内不可变；派生量（时隙、周期、匹配数）由此计算。

use std::fmt;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::sim::SimTime;

/// 负载类型（对应已发表的流大小分布）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadKind {
    Datamining,
    Websearch,
    Hadoop,
}

impl WorkloadKind {
    pub fn parse(s: &str) -> Option<WorkloadKind> {
        match s {
            "datamining" => Some(WorkloadKind::Datamining),
            "websearch" => Some(WorkloadKind::Websearch),
            "hadoop" => Some(WorkloadKind::Hadoop),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkloadKind::Datamining => "datamining",
            WorkloadKind::Websearch => "websearch",
            WorkloadKind::Hadoop => "hadoop",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 配置加载/校验错误。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot open config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid value {value:?} for key {key:?}")]
    Parse { key: String, value: String },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// 一次仿真运行的全部参数。
#[derive(Debug, Clone)]
pub struct SimConfig {
    // 网络参数
    pub num_racks: usize,
    pub num_switches: usize,
    pub hosts_per_rack: usize,
    pub link_rate_gbps: f64,
    pub mtu_bytes: u32,
    pub propagation_delay_us: f64,

    // RotorNet 参数
    pub reconfig_delay_us: f64,
    pub duty_cycle: f64,

    // 负载参数
    pub workload: WorkloadKind,
    pub load_factor: f64,
    pub sim_time_ms: f64,
    pub random_seed: u64,

    // 传输参数
    pub queue_size_pkts: usize,
    /// 直连 VOQ 深度超过该阈值时触发 VLB 间接路径
    pub queue_threshold: usize,
    /// 机架空闲且有包待发时，在下一个可用匹配处调度唤醒事件
    pub slot_wakeup: bool,

    // 流文件
    pub flow_file: String,
    pub save_flows: bool,
    pub flow_output_file: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            num_racks: 16,
            num_switches: 4,
            hosts_per_rack: 32,
            link_rate_gbps: 10.0,
            mtu_bytes: 1500,
            propagation_delay_us: 0.5,
            reconfig_delay_us: 20.0,
            duty_cycle: 0.9,
            workload: WorkloadKind::Datamining,
            load_factor: 0.25,
            sim_time_ms: 1000.0,
            random_seed: 42,
            queue_size_pkts: 100,
            queue_threshold: 50,
            slot_wakeup: true,
            flow_file: String::new(),
            save_flows: false,
            flow_output_file: "flows.csv".to_string(),
        }
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Parse {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ConfigError::Parse {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

impl SimConfig {
    /// 从文本文件加载并校验。
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let mut config = Self::from_str_pairs(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// 解析 `key value` 文本。未知键忽略，空行跳过。
    pub fn from_str_pairs(text: &str) -> Result<Self, ConfigError> {
        let mut config = SimConfig::default();
        for line in text.lines() {
            let mut it = line.split_whitespace();
            let Some(key) = it.next() else { continue };
            let Some(value) = it.next() else { continue };
            match key {
                "num_racks" => config.num_racks = parse_num(key, value)?,
                "num_switches" => config.num_switches = parse_num(key, value)?,
                "hosts_per_rack" => config.hosts_per_rack = parse_num(key, value)?,
                "link_rate_gbps" => config.link_rate_gbps = parse_num(key, value)?,
                "mtu_bytes" => config.mtu_bytes = parse_num(key, value)?,
                "propagation_delay_us" => config.propagation_delay_us = parse_num(key, value)?,
                "reconfig_delay_us" => config.reconfig_delay_us = parse_num(key, value)?,
                "duty_cycle" => config.duty_cycle = parse_num(key, value)?,
                "load_factor" => config.load_factor = parse_num(key, value)?,
                "sim_time_ms" => config.sim_time_ms = parse_num(key, value)?,
                "random_seed" => config.random_seed = parse_num(key, value)?,
                "queue_size_pkts" => config.queue_size_pkts = parse_num(key, value)?,
                "queue_threshold" => config.queue_threshold = parse_num(key, value)?,
                "slot_wakeup" => config.slot_wakeup = parse_bool(key, value)?,
                "save_flows" => config.save_flows = parse_bool(key, value)?,
                "flow_file" => config.flow_file = value.to_string(),
                "flow_output_file" => config.flow_output_file = value.to_string(),
                "workload" => {
                    config.workload =
                        WorkloadKind::parse(value).ok_or_else(|| ConfigError::Parse {
                            key: key.to_string(),
                            value: value.to_string(),
                        })?
                }
                _ => {} // 未知键忽略
            }
        }
        Ok(config)
    }

    /// 运行前校验。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_racks < 2 {
            return Err(ConfigError::Invalid(format!(
                "num_racks must be at least 2, got {}",
                self.num_racks
            )));
        }
        if self.num_switches < 1 {
            return Err(ConfigError::Invalid("num_switches must be at least 1".into()));
        }
        if self.hosts_per_rack < 1 {
            return Err(ConfigError::Invalid("hosts_per_rack must be at least 1".into()));
        }
        if !(self.link_rate_gbps > 0.0) {
            return Err(ConfigError::Invalid("link_rate_gbps must be positive".into()));
        }
        if self.mtu_bytes < 1 {
            return Err(ConfigError::Invalid("mtu_bytes must be at least 1".into()));
        }
        if !(self.duty_cycle > 0.0 && self.duty_cycle < 1.0) {
            return Err(ConfigError::Invalid(format!(
                "duty_cycle must be in (0, 1), got {}",
                self.duty_cycle
            )));
        }
        if !(self.reconfig_delay_us > 0.0) {
            return Err(ConfigError::Invalid("reconfig_delay_us must be positive".into()));
        }
        if self.slot_time().0 == 0 {
            return Err(ConfigError::Invalid(
                "slot time rounds to zero; increase reconfig_delay_us or lower duty_cycle".into(),
            ));
        }
        if self.queue_size_pkts < 1 {
            return Err(ConfigError::Invalid("queue_size_pkts must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.load_factor) {
            return Err(ConfigError::Invalid(format!(
                "load_factor must be in [0, 1], got {}",
                self.load_factor
            )));
        }
        if !(self.sim_time_ms > 0.0) {
            return Err(ConfigError::Invalid("sim_time_ms must be positive".into()));
        }
        Ok(())
    }

    /// 一个周期内需要轮换的匹配轮次总数（奇数机架含幻影轮）。
    pub fn num_rounds(&self) -> usize {
        if self.num_racks % 2 == 0 {
            self.num_racks - 1
        } else {
            self.num_racks
        }
    }

    /// 每台交换机承载的匹配数。
    pub fn num_matchings(&self) -> usize {
        self.num_rounds().div_ceil(self.num_switches)
    }

    /// 时隙长度（微秒）：重构死区按占空比摊出整个时隙。
    pub fn slot_time_us(&self) -> f64 {
        self.reconfig_delay_us / (1.0 - self.duty_cycle)
    }

    pub fn cycle_time_us(&self) -> f64 {
        self.num_matchings() as f64 * self.slot_time_us()
    }

    pub fn slot_time(&self) -> SimTime {
        SimTime::from_micros_f64(self.slot_time_us())
    }

    pub fn cycle_time(&self) -> SimTime {
        SimTime(self.slot_time().0.saturating_mul(self.num_matchings() as u64))
    }

    pub fn propagation_delay(&self) -> SimTime {
        SimTime::from_micros_f64(self.propagation_delay_us)
    }

    /// 仿真结束时刻。
    pub fn end_time(&self) -> SimTime {
        SimTime::from_millis_f64(self.sim_time_ms)
    }

    pub fn link_rate_bps(&self) -> f64 {
        self.link_rate_gbps * 1e9
    }

    /// 发送 `bytes` 字节所需的线上时间。
    pub fn tx_time(&self, bytes: u32) -> SimTime {
        let bits = f64::from(bytes) * 8.0;
        SimTime::from_micros_f64(bits / self.link_rate_bps() * 1e6)
    }
}
