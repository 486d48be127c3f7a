//! 负载生成
//!
//! 按已发表的流大小 CDF（VL2 datamining、DCTCP websearch、Facebook
//! hadoop）与泊松到达过程生成流列表，或从 CSV 文件加载。生成器使用
//! 以 `random_seed` 播种的独立 RNG，与引擎的 VLB RNG 互不干扰。

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::Exp;
use thiserror::Error;
use tracing::info;

use crate::config::{SimConfig, WorkloadKind};
use crate::net::{Flow, FlowId, FlowKind, RackId};

/// CDF 锚点：(size_bytes, 累积概率)。
type CdfPoint = (u64, f64);

// VL2 论文 datamining 负载
const CDF_DATAMINING: &[CdfPoint] = &[
    (100, 0.0),
    (1_000, 0.5),
    (10_000, 0.6),
    (100_000, 0.7),
    (1_000_000, 0.8),
    (10_000_000, 0.9),
    (100_000_000, 0.97),
    (1_000_000_000, 1.0),
];

// DCTCP 论文 websearch 负载
const CDF_WEBSEARCH: &[CdfPoint] = &[
    (100, 0.0),
    (1_000, 0.15),
    (10_000, 0.2),
    (100_000, 0.3),
    (1_000_000, 0.4),
    (10_000_000, 0.53),
    (100_000_000, 0.6),
    (300_000_000, 1.0),
];

// Facebook 论文 hadoop 负载
const CDF_HADOOP: &[CdfPoint] = &[
    (1_000, 0.0),
    (10_000, 0.05),
    (100_000, 0.2),
    (1_000_000, 0.5),
    (10_000_000, 0.7),
    (100_000_000, 0.85),
    (1_000_000_000, 1.0),
];

pub(crate) fn cdf_for(kind: WorkloadKind) -> &'static [CdfPoint] {
    match kind {
        WorkloadKind::Datamining => CDF_DATAMINING,
        WorkloadKind::Websearch => CDF_WEBSEARCH,
        WorkloadKind::Hadoop => CDF_HADOOP,
    }
}

/// 各负载的平均流大小（字节），用于换算泊松到达率。
pub(crate) fn average_flow_size_bytes(kind: WorkloadKind) -> f64 {
    match kind {
        WorkloadKind::Datamining => 50e6,
        WorkloadKind::Websearch => 5e6,
        WorkloadKind::Hadoop => 30e6,
    }
}

/// 流文件加载/保存错误。
#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("cannot open flow file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed flow record at line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

const FLOW_CSV_HEADER: &str =
    "flow_id,src_rack,dst_rack,src_host,dst_host,size_bytes,start_time_ms,flow_type";

/// 流负载生成器。
pub struct WorkloadGenerator {
    config: SimConfig,
    rng: ChaCha8Rng,
    next_flow_id: u64,
}

impl WorkloadGenerator {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            config: config.clone(),
            rng: ChaCha8Rng::seed_from_u64(config.random_seed),
            next_flow_id: 0,
        }
    }

    /// 生成整个仿真时域内的流列表。
    ///
    /// 到达率 λ = load_factor · (R·H·link_rate) / 平均流大小（bit），
    /// 到达间隔取 Exp(λ)。load_factor = 0 时没有流。
    pub fn generate_flows(&mut self) -> Vec<Flow> {
        let total_hosts = (self.config.num_racks * self.config.hosts_per_rack) as f64;
        let total_capacity_bps = total_hosts * self.config.link_rate_bps();
        let avg_flow_size_bits = average_flow_size_bytes(self.config.workload) * 8.0;
        let lambda_per_ms =
            self.config.load_factor * total_capacity_bps / avg_flow_size_bits / 1000.0;

        let mut flows = Vec::new();
        if lambda_per_ms <= 0.0 {
            info!("到达率为 0，不生成流");
            return flows;
        }
        let interarrival = Exp::new(lambda_per_ms).expect("positive arrival rate");

        let mut current_time_ms = 0.0;
        while current_time_ms < self.config.sim_time_ms {
            let src_rack = RackId(self.rng.gen_range(0..self.config.num_racks));
            // 只生成跨机架流量
            let mut dst_rack = RackId(self.rng.gen_range(0..self.config.num_racks));
            while dst_rack == src_rack {
                dst_rack = RackId(self.rng.gen_range(0..self.config.num_racks));
            }
            let src_host = self.rng.gen_range(0..self.config.hosts_per_rack);
            let dst_host = self.rng.gen_range(0..self.config.hosts_per_rack);
            let size_bytes = self.sample_flow_size();

            flows.push(Flow::new(
                FlowId(self.next_flow_id),
                src_rack,
                dst_rack,
                src_host,
                dst_host,
                size_bytes,
                current_time_ms,
                // 指定范围内全部按 bulk 处理；低时延类走的包交换路径不在模型内
                FlowKind::Bulk,
            ));
            self.next_flow_id += 1;

            current_time_ms += self.rng.sample(interarrival);
        }

        info!(flows = flows.len(), workload = %self.config.workload, "负载生成完成");
        flows
    }

    /// 按 CDF 采样流大小：在命中的分段内对 log10(size) 线性插值。
    fn sample_flow_size(&mut self) -> u64 {
        let cdf = cdf_for(self.config.workload);
        let u: f64 = self.rng.gen();

        for i in 1..cdf.len() {
            let (size_lo, p_lo) = cdf[i - 1];
            let (size_hi, p_hi) = cdf[i];
            if u <= p_hi {
                let frac = (u - p_lo) / (p_hi - p_lo);
                let log_size =
                    (size_lo as f64).log10() + frac * ((size_hi as f64).log10() - (size_lo as f64).log10());
                return 10f64.powf(log_size) as u64;
            }
        }
        cdf.last().map(|&(size, _)| size).unwrap_or(0)
    }
}

/// 保存流列表为 CSV（带表头）。
pub fn save_flows_to_file(flows: &[Flow], path: impl AsRef<Path>) -> Result<(), WorkloadError> {
    let mut file = File::create(path.as_ref())?;
    writeln!(file, "{FLOW_CSV_HEADER}")?;
    for flow in flows {
        writeln!(
            file,
            "{},{},{},{},{},{},{},{}",
            flow.id.0,
            flow.src_rack.0,
            flow.dst_rack.0,
            flow.src_host,
            flow.dst_host,
            flow.size_bytes,
            flow.start_time_ms,
            flow.kind.as_str(),
        )?;
    }
    info!(flows = flows.len(), path = %path.as_ref().display(), "流列表已保存");
    Ok(())
}

/// 从 CSV 加载流列表（首行表头必需）。
pub fn load_flows_from_file(
    path: impl AsRef<Path>,
    config: &SimConfig,
) -> Result<Vec<Flow>, WorkloadError> {
    let file = File::open(path.as_ref())?;
    let mut lines = BufReader::new(file).lines();

    // 表头
    match lines.next() {
        Some(header) => {
            header?;
        }
        None => {
            return Err(WorkloadError::Malformed {
                line: 1,
                reason: "missing header line".into(),
            })
        }
    }

    let mut flows = Vec::new();
    for (idx, line) in lines.enumerate() {
        let line_no = idx + 2;
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != 8 {
            return Err(WorkloadError::Malformed {
                line: line_no,
                reason: format!("expected 8 fields, got {}", fields.len()),
            });
        }
        let malformed = |reason: String| WorkloadError::Malformed {
            line: line_no,
            reason,
        };
        let parse_field = |name: &str, value: &str| -> Result<u64, WorkloadError> {
            value
                .trim()
                .parse()
                .map_err(|_| malformed(format!("bad {name}: {value:?}")))
        };

        let id = parse_field("flow_id", fields[0])?;
        let src_rack = parse_field("src_rack", fields[1])? as usize;
        let dst_rack = parse_field("dst_rack", fields[2])? as usize;
        let src_host = parse_field("src_host", fields[3])? as usize;
        let dst_host = parse_field("dst_host", fields[4])? as usize;
        let size_bytes = parse_field("size_bytes", fields[5])?;
        let start_time_ms: f64 = fields[6]
            .trim()
            .parse()
            .map_err(|_| malformed(format!("bad start_time_ms: {:?}", fields[6])))?;
        let kind = FlowKind::parse(fields[7].trim())
            .ok_or_else(|| malformed(format!("bad flow_type: {:?}", fields[7])))?;

        if src_rack == dst_rack {
            return Err(malformed(format!("intra-rack flow {src_rack}->{dst_rack}")));
        }
        if src_rack >= config.num_racks || dst_rack >= config.num_racks {
            return Err(malformed(format!(
                "rack out of range (num_racks = {})",
                config.num_racks
            )));
        }

        flows.push(Flow::new(
            FlowId(id),
            RackId(src_rack),
            RackId(dst_rack),
            src_host,
            dst_host,
            size_bytes,
            start_time_ms,
            kind,
        ));
    }

    info!(flows = flows.len(), path = %path.as_ref().display(), "流列表已加载");
    Ok(flows)
}
