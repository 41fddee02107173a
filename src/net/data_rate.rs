//! 比特率
//!
//! 拓扑表和场景文件沿用 "100Mbps"、"4000kb/s" 这种写法；
//! 内部统一换算成 bit/s。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::sim::SimTime;

/// 比特率（bit/s）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DataRate(pub u64);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseRateError {
    #[error("empty data rate")]
    Empty,
    #[error("invalid number in data rate `{0}`")]
    Number(String),
    #[error("unknown data rate unit `{unit}` in `{input}`")]
    Unit { input: String, unit: String },
}

impl DataRate {
    pub fn bps(self) -> u64 {
        self.0
    }

    pub fn from_kbps(k: u64) -> Self {
        DataRate(k.saturating_mul(1_000))
    }

    pub fn from_mbps(m: u64) -> Self {
        DataRate(m.saturating_mul(1_000_000))
    }

    /// 以该速率串行化 `bytes` 所需时间：ceil(bits / bps)。
    pub fn tx_time(self, bytes: u32) -> SimTime {
        if self.0 == 0 {
            return SimTime(u64::MAX / 4);
        }
        let bits = (bytes as u128) * 8;
        let bps = self.0 as u128;
        let nanos = (bits * 1_000_000_000 + (bps - 1)) / bps;
        SimTime(nanos.min(u64::MAX as u128) as u64)
    }
}

impl FromStr for DataRate {
    type Err = ParseRateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseRateError::Empty);
        }
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(s.len());
        let (num, unit) = s.split_at(split);
        let value: f64 = num
            .parse()
            .map_err(|_| ParseRateError::Number(s.to_string()))?;

        let unit = unit.trim();
        let (scale, rest) = match unit.chars().next() {
            Some('k' | 'K') => (1e3, &unit[1..]),
            Some('m' | 'M') => (1e6, &unit[1..]),
            Some('g' | 'G') => (1e9, &unit[1..]),
            _ => (1.0, unit),
        };
        let per_unit = match rest {
            "" | "bps" | "b/s" => 1.0,
            "Bps" | "B/s" => 8.0,
            _ => {
                return Err(ParseRateError::Unit {
                    input: s.to_string(),
                    unit: unit.to_string(),
                });
            }
        };
        Ok(DataRate((value * scale * per_unit).round() as u64))
    }
}

impl fmt::Display for DataRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bps = self.0;
        if bps != 0 && bps % 1_000_000_000 == 0 {
            write!(f, "{}Gbps", bps / 1_000_000_000)
        } else if bps != 0 && bps % 1_000_000 == 0 {
            write!(f, "{}Mbps", bps / 1_000_000)
        } else if bps != 0 && bps % 1_000 == 0 {
            write!(f, "{}kbps", bps / 1_000)
        } else {
            write!(f, "{bps}bps")
        }
    }
}

impl Serialize for DataRate {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DataRate {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Bits(u64),
            Text(String),
        }
        match Repr::deserialize(d)? {
            Repr::Bits(b) => Ok(DataRate(b)),
            Repr::Text(t) => t.parse().map_err(serde::de::Error::custom),
        }
    }
}
