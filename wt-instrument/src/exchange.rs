use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt::{Display, Formatter};

/// A venue code, eg/ `SHFE`, `DCE`, `CZCE`, `INE`, `CFFEX`, `SSE`, `SZSE`.
///
/// Kept as an interned [`SmolStr`] rather than a closed enum: the
/// registry is configuration-driven, and new venues are added by
/// editing config, not by recompiling.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize,
)]
pub struct Exchange(pub SmolStr);

impl Exchange {
    pub fn new(code: impl Into<SmolStr>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// CFFEX (China Financial Futures Exchange) requires special handling
    /// at the execution boundary: market orders must translate to
    /// "best-five-levels price" rather than any-price.
    pub fn is_cffex(&self) -> bool {
        self.0.eq_ignore_ascii_case("CFFEX")
    }

    /// Zhengzhou Commodity Exchange carries second-granularity tick
    /// timestamps, which drives the store's dedup/bump rule.
    pub fn is_czce(&self) -> bool {
        self.0.eq_ignore_ascii_case("CZCE")
    }
}

impl Display for Exchange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Exchange {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A contract code within an [`Exchange`], eg/ `au2406`, `600000`.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize,
)]
pub struct Code(pub SmolStr);

impl Code {
    pub fn new(code: impl Into<SmolStr>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for Code {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Code {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// The `"EX.CODE"` standard identifier used throughout logs, output
/// files and subscription maps.
pub fn full_code(exchange: &Exchange, code: &Code) -> SmolStr {
    SmolStr::new(format!("{exchange}.{code}"))
}

/// Splits a `"EX.CODE"` standard identifier back into its parts.
pub fn split_full_code(std_code: &str) -> Option<(Exchange, Code)> {
    let (exchange, code) = std_code.split_once('.')?;
    Some((Exchange::new(exchange), Code::new(code)))
}
