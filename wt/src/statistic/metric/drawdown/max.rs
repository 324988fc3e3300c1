use crate::statistic::metric::drawdown::Drawdown;
use derive_more::Constructor;
use serde::{Deserialize, Serialize};

/// The largest closed [`Drawdown`] period seen across a context's whole
/// run, used as the risk measure behind [`CalmarRatio`](super::super::CalmarRatio).
///
/// See documentation: <https://www.investopedia.com/terms/m/maximum-drawdown-mdd.asp>
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Deserialize, Serialize, Constructor)]
pub struct MaxDrawdown(pub Drawdown);

/// Streaming generator that keeps whichever closed [`Drawdown`] has had
/// the largest magnitude so far.
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Deserialize, Serialize, Constructor)]
pub struct MaxDrawdownGenerator {
    pub max: Option<MaxDrawdown>,
}

impl MaxDrawdownGenerator {
    /// Seed a [`MaxDrawdownGenerator`] from the first closed [`Drawdown`].
    pub fn init(drawdown: Drawdown) -> Self {
        Self {
            max: Some(MaxDrawdown(drawdown)),
        }
    }

    /// Fold in the latest closed [`Drawdown`]; it supersedes the current
    /// max if its magnitude is larger.
    pub fn update(&mut self, next_drawdown: &Drawdown) {
        let max = match self.max.take() {
            Some(current) if next_drawdown.value.abs() > current.0.value.abs() => {
                MaxDrawdown(next_drawdown.clone())
            }
            Some(current) => current,
            None => MaxDrawdown(next_drawdown.clone()),
        };

        self.max = Some(max);
    }

    /// Current [`MaxDrawdown`], if any [`Drawdown`] has closed yet.
    pub fn generate(&self) -> Option<MaxDrawdown> {
        self.max.clone()
    }
}
