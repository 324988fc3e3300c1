use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

/// Key into the engine's `bar_sub_map`: a contract code plus the
/// period/multiplier pair a context asked for, eg/ `rb2410#m#5` for a
/// 5-minute bar on `rb2410`. Round-trips through `Display`/`FromStr` so
/// it can double as the map key and a stable wire-format string.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub struct BarSubKey {
    pub code: SmolStr,
    pub period: SmolStr,
    pub times: u32,
}

impl BarSubKey {
    pub fn new(code: impl Into<SmolStr>, period: impl Into<SmolStr>, times: u32) -> Self {
        Self {
            code: code.into(),
            period: period.into(),
            times,
        }
    }
}

impl fmt::Display for BarSubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}#{}", self.code, self.period, self.times)
    }
}

#[derive(Debug, thiserror::Error, Eq, PartialEq)]
pub enum BarSubKeyParseError {
    #[error("malformed bar subscription key '{0}', expected code#period#times")]
    Malformed(String),
    #[error("invalid times field in bar subscription key '{0}'")]
    InvalidTimes(String),
}

impl std::str::FromStr for BarSubKey {
    type Err = BarSubKeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('#');
        let (Some(code), Some(period), Some(times), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(BarSubKeyParseError::Malformed(s.to_string()));
        };
        let times: u32 = times
            .parse()
            .map_err(|_| BarSubKeyParseError::InvalidTimes(s.to_string()))?;
        Ok(BarSubKey::new(code, period, times))
    }
}

/// Which L2 submap a subscription belongs to: `orddtl_sub_map`,
/// `ordque_sub_map`, `trans_sub_map`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub enum L2Stream {
    OrderDetail,
    OrderQueue,
    Transaction,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn round_trips_through_display_and_from_str() {
        let key = BarSubKey::new("rb2410", "m", 5);
        let rendered = key.to_string();
        assert_eq!(rendered, "rb2410#m#5");
        assert_eq!(BarSubKey::from_str(&rendered).unwrap(), key);
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(BarSubKey::from_str("rb2410#m").is_err());
        assert!(BarSubKey::from_str("rb2410#m#5#extra").is_err());
        assert!(BarSubKey::from_str("rb2410#m#notanumber").is_err());
    }
}
