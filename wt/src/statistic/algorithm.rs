/// [Welford Online](https://en.wikipedia.org/wiki/Algorithms_for_calculating_variance#Welford's_online_algorithm)
/// recurrences used to fold successive `record_equity` return samples
/// into a running mean and variance without retaining the full history -
/// this is what makes [`TradingSummaryGenerator`](super::summary::TradingSummaryGenerator)
/// able to run alongside a live session.
pub mod welford_online {
    use rust_decimal::Decimal;

    /// Next running mean given the previous mean, the newest sample, and
    /// the updated sample count.
    pub fn calculate_mean<T>(mut prev_mean: T, next_value: T, count: T) -> T
    where
        T: Copy + std::ops::Sub<Output = T> + std::ops::Div<Output = T> + std::ops::AddAssign,
    {
        prev_mean += (next_value - prev_mean) / count;
        prev_mean
    }

    /// Next Welford recurrence relation M, the running sum of squared
    /// deviations that sample and population variance are derived from.
    pub fn calculate_recurrence_relation_m(
        prev_m: Decimal,
        prev_mean: Decimal,
        new_value: Decimal,
        new_mean: Decimal,
    ) -> Decimal {
        prev_m + ((new_value - prev_mean) * (new_value - new_mean))
    }

    /// Unbiased sample variance (Bessel's correction, `count - 1`) from
    /// the recurrence relation M.
    pub fn calculate_sample_variance(recurrence_relation_m: Decimal, count: Decimal) -> Decimal {
        if count < Decimal::TWO {
            Decimal::ZERO
        } else {
            recurrence_relation_m / (count - Decimal::ONE)
        }
    }

    /// Biased population variance from the recurrence relation M.
    pub fn calculate_population_variance(
        recurrence_relation_m: Decimal,
        count: Decimal,
    ) -> Decimal {
        if count < Decimal::ONE {
            Decimal::ZERO
        } else {
            recurrence_relation_m / count
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::str::FromStr;

    #[test]
    fn calculate_mean_folds_a_return_series_one_sample_at_a_time() {
        struct Case {
            prev_mean: Decimal,
            next_value: Decimal,
            count: Decimal,
            expected: Decimal,
        }

        // equity-return series = [0.1, -0.2, -0.05, 0.2, 0.15, -0.17]
        let cases = vec![
            Case { prev_mean: dec!(0.0), next_value: dec!(0.1), count: dec!(1.0), expected: dec!(0.1) },
            Case { prev_mean: dec!(0.1), next_value: dec!(-0.2), count: dec!(2.0), expected: dec!(-0.05) },
            Case { prev_mean: dec!(-0.05), next_value: dec!(-0.05), count: dec!(3.0), expected: dec!(-0.05) },
            Case { prev_mean: dec!(-0.05), next_value: dec!(0.2), count: dec!(4.0), expected: dec!(0.0125) },
            Case { prev_mean: dec!(0.0125), next_value: dec!(0.15), count: dec!(5.0), expected: dec!(0.04) },
            Case { prev_mean: dec!(0.04), next_value: dec!(-0.17), count: dec!(6.0), expected: dec!(0.005) },
        ];

        for (index, case) in cases.into_iter().enumerate() {
            let actual = welford_online::calculate_mean(case.prev_mean, case.next_value, case.count);
            assert_eq!(actual, case.expected, "TC{index} failed");
        }
    }

    #[test]
    fn calculate_recurrence_relation_m_matches_hand_computed_series() {
        struct Case {
            prev_m: Decimal,
            prev_mean: Decimal,
            new_value: Decimal,
            new_mean: Decimal,
        }

        let cases = vec![
            // series_1 = [10, 100, -10]
            Case { prev_m: dec!(0.0), prev_mean: dec!(0.0), new_value: dec!(10.0), new_mean: dec!(10.0) },
            Case { prev_m: dec!(0.0), prev_mean: dec!(10.0), new_value: dec!(100.0), new_mean: dec!(55.0) },
            Case {
                prev_m: dec!(4050.0),
                prev_mean: dec!(55.0),
                new_value: dec!(-10.0),
                new_mean: Decimal::from_str("33.333333333333333333").unwrap(),
            },
            // series_2 = [-5, -50, -1000]
            Case { prev_m: dec!(0.0), prev_mean: dec!(0.0), new_value: dec!(-5.0), new_mean: dec!(-5.0) },
            Case { prev_m: dec!(0.0), prev_mean: dec!(-5.0), new_value: dec!(-50.0), new_mean: dec!(-27.5) },
            Case {
                prev_m: dec!(1012.5),
                prev_mean: dec!(-27.5),
                new_value: dec!(-1000.0),
                new_mean: dec!(-351.666666666666666667),
            },
            // series_3 = [90000, -90000, 0]
            Case { prev_m: dec!(0.0), prev_mean: dec!(0.0), new_value: dec!(90000.0), new_mean: dec!(90000.0) },
            Case { prev_m: dec!(0.0), prev_mean: dec!(90000.0), new_value: dec!(-90000.0), new_mean: dec!(0.0) },
            Case { prev_m: dec!(16200000000.0), prev_mean: dec!(0.0), new_value: dec!(0.0), new_mean: dec!(0.0) },
        ];

        let expected = vec![
            dec!(0.0),
            dec!(4050.0),
            dec!(6866.6666666666666666450),
            dec!(0.0),
            dec!(1012.5),
            dec!(631516.6666666666666663425),
            dec!(0.0),
            dec!(16200000000.0),
            dec!(16200000000.0),
        ];

        for (index, (case, expected)) in cases.iter().zip(expected.into_iter()).enumerate() {
            let actual = welford_online::calculate_recurrence_relation_m(
                case.prev_m,
                case.prev_mean,
                case.new_value,
                case.new_mean,
            );
            assert_eq!(actual, expected, "TC{index} failed");
        }
    }

    #[test]
    fn calculate_sample_variance_applies_bessels_correction() {
        let cases = vec![
            (dec!(0.0), dec!(1)),
            (dec!(1050.0), dec!(5)),
            (dec!(1012.5), dec!(123223)),
            (dec!(16200000000.0), dec!(3)),
            (dec!(99999.9999), dec!(23232)),
        ];
        let expected = vec![
            dec!(0.0),
            dec!(262.5),
            dec!(0.0082168768564055120027267858),
            dec!(8100000000.0),
            dec!(4.3045929964271878093926219276),
        ];

        for ((m, count), expected) in cases.iter().zip(expected.into_iter()) {
            assert_eq!(welford_online::calculate_sample_variance(*m, *count), expected);
        }
    }

    #[test]
    fn calculate_population_variance_divides_by_the_raw_count() {
        let cases = vec![
            (dec!(0.0), 1),
            (dec!(1050.0), 5),
            (dec!(1012.5), 123223),
            (dec!(16200000000.0), 3),
            (dec!(99999.9999), 23232),
        ];
        let expected = vec![
            dec!(0.0),
            dec!(210.0),
            dec!(0.0082168101734254157097295148),
            dec!(5400000000.0),
            dec!(4.3044077091942148760330578512),
        ];

        for (index, ((m, count), expected)) in cases.iter().zip(expected.into_iter()).enumerate() {
            let actual = welford_online::calculate_population_variance(*m, (*count).into());
            assert_eq!(actual, expected, "TC{index} failed");
        }
    }
}
