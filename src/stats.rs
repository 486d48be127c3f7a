//! 统计汇总
//!
//! 消费运行结束后的流记录，输出 FCT 分位数、吞吐与丢包计数到
//! stdout 与结果 CSV。

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::net::Flow;

/// 仿真结果统计。
#[derive(Debug, Default)]
pub struct Statistics {
    fcts_ms: Vec<f64>,
    total_flows: u64,
    completed_flows: u64,
    dropped_packets: u64,
    throughput_gbps: f64,
    sim_time_ms: f64,
}

impl Statistics {
    pub fn new(sim_time_ms: f64) -> Self {
        Self {
            sim_time_ms,
            ..Self::default()
        }
    }

    pub fn add_flow(&mut self, flow: &Flow) {
        self.total_flows += 1;
        if let Some(fct) = flow.fct_ms() {
            self.completed_flows += 1;
            self.fcts_ms.push(fct);
        }
    }

    pub fn set_dropped_packets(&mut self, dropped: u64) {
        self.dropped_packets = dropped;
    }

    pub fn set_throughput_gbps(&mut self, gbps: f64) {
        self.throughput_gbps = gbps;
    }

    pub fn total_flows(&self) -> u64 {
        self.total_flows
    }

    pub fn completed_flows(&self) -> u64 {
        self.completed_flows
    }

    pub fn dropped_packets(&self) -> u64 {
        self.dropped_packets
    }

    pub fn throughput_gbps(&self) -> f64 {
        self.throughput_gbps
    }

    /// FCT 分位数（毫秒）。排序后取下标 ⌊p·n⌋，夹到末元素。
    pub fn fct_percentile_ms(&self, p: f64) -> Option<f64> {
        if self.fcts_ms.is_empty() {
            return None;
        }
        let mut sorted = self.fcts_ms.clone();
        sorted.sort_by(|a, b| a.partial_cmp(b).expect("finite FCT"));
        let idx = ((p * sorted.len() as f64) as usize).min(sorted.len() - 1);
        Some(sorted[idx])
    }

    pub fn mean_fct_ms(&self) -> Option<f64> {
        if self.fcts_ms.is_empty() {
            return None;
        }
        Some(self.fcts_ms.iter().sum::<f64>() / self.fcts_ms.len() as f64)
    }

    /// 打印摘要到 stdout。
    pub fn print(&self) {
        println!("\n========== Simulation Results ==========");
        println!("\nFlow Statistics:");
        println!("  Total flows: {}", self.total_flows);
        let pct = if self.total_flows > 0 {
            100.0 * self.completed_flows as f64 / self.total_flows as f64
        } else {
            0.0
        };
        println!("  Completed flows: {} ({pct:.3}%)", self.completed_flows);
        println!("  Dropped packets: {}", self.dropped_packets);

        if !self.fcts_ms.is_empty() {
            println!("\nFlow Completion Times:");
            println!("  Mean: {:.3} ms", self.mean_fct_ms().unwrap_or(0.0));
            println!("  Median: {:.3} ms", self.fct_percentile_ms(0.5).unwrap_or(0.0));
            println!("  95th: {:.3} ms", self.fct_percentile_ms(0.95).unwrap_or(0.0));
            println!("  99th: {:.3} ms", self.fct_percentile_ms(0.99).unwrap_or(0.0));
            println!("  Max: {:.3} ms", self.fct_percentile_ms(1.0).unwrap_or(0.0));
        }

        println!("\nThroughput:");
        println!("  Average: {:.3} Gb/s", self.throughput_gbps);
        println!("  Simulated time: {:.3} ms", self.sim_time_ms);
        println!("\n========================================");
    }

    /// 写结果 CSV（header：metric,value）。
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let mut file = File::create(path)?;
        writeln!(file, "metric,value")?;
        writeln!(file, "total_flows,{}", self.total_flows)?;
        writeln!(file, "completed_flows,{}", self.completed_flows)?;
        writeln!(file, "dropped_packets,{}", self.dropped_packets)?;
        writeln!(file, "throughput_gbps,{}", self.throughput_gbps)?;
        if !self.fcts_ms.is_empty() {
            writeln!(file, "mean_fct_ms,{}", self.mean_fct_ms().unwrap_or(0.0))?;
            writeln!(file, "median_fct_ms,{}", self.fct_percentile_ms(0.5).unwrap_or(0.0))?;
            writeln!(file, "p95_fct_ms,{}", self.fct_percentile_ms(0.95).unwrap_or(0.0))?;
            writeln!(file, "p99_fct_ms,{}", self.fct_percentile_ms(0.99).unwrap_or(0.0))?;
        }
        Ok(())
    }
}
