use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ratio of gross winning `CloseLog.profit` to gross losing
/// `CloseLog.profit` for a context's full run. A value above one means
/// the context's wins outweighed its losses in aggregate.
///
/// - `None` when both the win and loss totals are zero (nothing closed yet).
/// - `Decimal::MAX` when there are wins but no losses.
/// - `Decimal::MIN` when there are losses but no wins.
///
/// See docs: <https://www.investopedia.com/articles/fundamental-analysis/10/strategy-performance-reports.asp#toc-profit-factor>
#[derive(Debug, Clone, PartialEq, PartialOrd, Default, Deserialize, Serialize)]
pub struct ProfitFactor {
    pub value: Decimal,
}

impl ProfitFactor {
    /// Calculate the [`ProfitFactor`] from the summed gross profit and
    /// gross loss of a context's closed trades (both non-negative).
    pub fn calculate(profits_gross_abs: Decimal, losses_gross_abs: Decimal) -> Option<Self> {
        if profits_gross_abs.is_zero() && losses_gross_abs.is_zero() {
            return None;
        }

        let value = if losses_gross_abs.is_zero() {
            Decimal::MAX
        } else if profits_gross_abs.is_zero() {
            Decimal::MIN
        } else {
            profits_gross_abs.abs().checked_div(losses_gross_abs.abs())?
        };

        Some(Self { value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    struct Case {
        profits_gross_abs: Decimal,
        losses_gross_abs: Decimal,
        expected: Option<Decimal>,
    }

    #[test]
    fn calculate_covers_the_trading_edge_cases() {
        let cases = vec![
            // no closes at all this run
            Case {
                profits_gross_abs: dec!(0.0),
                losses_gross_abs: dec!(0.0),
                expected: None,
            },
            // a context that only ever lost
            Case {
                profits_gross_abs: dec!(0.0),
                losses_gross_abs: dec!(1.0),
                expected: Some(Decimal::MIN),
            },
            // a context that never lost
            Case {
                profits_gross_abs: dec!(1.0),
                losses_gross_abs: dec!(0.0),
                expected: Some(Decimal::MAX),
            },
            // balanced wins and losses
            Case {
                profits_gross_abs: dec!(10.0),
                losses_gross_abs: dec!(5.0),
                expected: Some(dec!(2.0)),
            },
            // loss total passed in without its sign normalised first
            Case {
                profits_gross_abs: dec!(10.0),
                losses_gross_abs: dec!(-5.0),
                expected: Some(dec!(2.0)),
            },
            // both totals negligibly small
            Case {
                profits_gross_abs: Decimal::from_scientific("1e-20").unwrap(),
                losses_gross_abs: Decimal::from_scientific("1e-20").unwrap(),
                expected: Some(Decimal::ONE),
            },
            // both totals near Decimal's ceiling
            Case {
                profits_gross_abs: Decimal::MAX / dec!(2),
                losses_gross_abs: Decimal::MAX / dec!(2),
                expected: Some(Decimal::ONE),
            },
            // precise fractional totals
            Case {
                profits_gross_abs: dec!(10.5555),
                losses_gross_abs: dec!(5.2345),
                expected: Some(Decimal::from_str("2.016524978507975928933040405").unwrap()),
            },
        ];

        for (index, case) in cases.into_iter().enumerate() {
            let actual = ProfitFactor::calculate(case.profits_gross_abs, case.losses_gross_abs);
            assert_eq!(actual.map(|pf| pf.value), case.expected, "TC{index} failed");
        }
    }
}
