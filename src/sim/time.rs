//! 仿真时间类型
//!
//! 定义仿真时间及其单位转换。内部以纳秒计，配置层的微秒/毫秒
//! 数值经四舍五入转换后不损失精度（如 20 μs 重构间隔 = 20_000 ns）。

/// 仿真时间（纳秒）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    pub fn from_micros(us: u64) -> SimTime {
        SimTime(us.saturating_mul(1_000))
    }

    pub fn from_millis(ms: u64) -> SimTime {
        SimTime(ms.saturating_mul(1_000_000))
    }

    pub fn from_secs(s: u64) -> SimTime {
        SimTime(s.saturating_mul(1_000_000_000))
    }

    /// 微秒（浮点）转仿真时间，四舍五入到纳秒。非有限值与负值视为 0。
    pub fn from_micros_f64(us: f64) -> SimTime {
        if !us.is_finite() || us <= 0.0 {
            return SimTime::ZERO;
        }
        SimTime((us * 1_000.0).round() as u64)
    }

    /// 毫秒（浮点）转仿真时间，四舍五入到纳秒。
    pub fn from_millis_f64(ms: f64) -> SimTime {
        if !ms.is_finite() || ms <= 0.0 {
            return SimTime::ZERO;
        }
        SimTime((ms * 1_000_000.0).round() as u64)
    }

    pub fn as_micros_f64(self) -> f64 {
        self.0 as f64 / 1_000.0
    }

    pub fn as_millis_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    pub fn saturating_add(self, other: SimTime) -> SimTime {
        SimTime(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(self, other: SimTime) -> SimTime {
        SimTime(self.0.saturating_sub(other.0))
    }
}
