pub mod config;
pub mod net;
pub mod sim;
pub mod stats;
pub mod workload;

#[cfg(test)]
mod test;

// 导出常用类型，供 bin 文件使用
pub use config::{ConfigError, SimConfig, WorkloadKind};
pub use sim::Simulator;
pub use stats::Statistics;
pub use workload::{WorkloadError, WorkloadGenerator};
