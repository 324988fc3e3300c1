use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fraction of a context's closed trades that were winners.
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Deserialize, Serialize)]
pub struct WinRate {
    pub value: Decimal,
}

impl WinRate {
    /// Calculate the [`WinRate`] from a count of winning closes and the
    /// total close count. `None` when nothing has closed yet.
    pub fn calculate(wins: Decimal, total: Decimal) -> Option<Self> {
        if total == Decimal::ZERO {
            None
        } else {
            let value = wins.abs().checked_div(total.abs())?;
            Some(Self { value })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    struct Case {
        wins: Decimal,
        total: Decimal,
        expected: Option<Decimal>,
    }

    #[test]
    fn calculate_folds_a_context_win_loss_count_into_a_fraction() {
        let cases = vec![
            // nothing closed yet this run
            Case {
                wins: Decimal::ZERO,
                total: Decimal::ZERO,
                expected: None,
            },
            // every close was a winner
            Case {
                wins: Decimal::TEN,
                total: Decimal::TEN,
                expected: Some(Decimal::ONE),
            },
            // every close was a loser
            Case {
                wins: Decimal::ZERO,
                total: Decimal::TEN,
                expected: Some(Decimal::ZERO),
            },
            // a mix of winners and losers
            Case {
                wins: dec!(6),
                total: Decimal::TEN,
                expected: Some(dec!(0.6)),
            },
        ];

        for (index, case) in cases.into_iter().enumerate() {
            let actual = WinRate::calculate(case.wins, case.total).map(|wr| wr.value);
            assert_eq!(actual, case.expected, "TC{index} failed");
        }
    }
}
