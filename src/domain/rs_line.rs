//! RS Line: stock price divided by benchmark price on every shared date.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RsLinePoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Always a full time series; downstream indicators need its history and
/// 52-week extrema, not just the latest ratio.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RsLine {
    points: Vec<RsLinePoint>,
}

impl RsLine {
    /// Ratio of aligned prices. Dates where either price is non-finite or not
    /// strictly positive are skipped.
    pub fn from_aligned(dates: &[NaiveDate], stock: &[f64], market: &[f64]) -> Self {
        let points = dates
            .iter()
            .zip(stock.iter().zip(market.iter()))
            .filter(|(_, (s, m))| s.is_finite() && m.is_finite() && **s > 0.0 && **m > 0.0)
            .map(|(date, (s, m))| RsLinePoint {
                date: *date,
                value: s / m,
            })
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[RsLinePoint] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<RsLinePoint> {
        self.points.last().copied()
    }

    /// The most recent `count` values, oldest first.
    pub fn tail(&self, count: usize) -> &[RsLinePoint] {
        let start = self.points.len().saturating_sub(count);
        &self.points[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn days(n: u32) -> Vec<NaiveDate> {
        (1..=n)
            .map(|d| NaiveDate::from_ymd_opt(2024, 3, d).unwrap())
            .collect()
    }

    #[test]
    fn ratio_of_prices() {
        let line = RsLine::from_aligned(&days(3), &[10.0, 20.0, 30.0], &[5.0, 5.0, 10.0]);
        assert_eq!(line.values(), vec![2.0, 4.0, 3.0]);
        assert_eq!(line.latest().unwrap().date, days(3)[2]);
    }

    #[test]
    fn skips_non_positive_and_non_finite() {
        let line = RsLine::from_aligned(
            &days(4),
            &[10.0, 0.0, f64::NAN, 12.0],
            &[5.0, 5.0, 5.0, -1.0],
        );
        assert_eq!(line.len(), 1);
        assert_eq!(line.points()[0].date, days(4)[0]);
    }

    #[test]
    fn tail_clamps_to_length() {
        let line = RsLine::from_aligned(&days(3), &[1.0, 2.0, 3.0], &[1.0, 1.0, 1.0]);
        assert_eq!(line.tail(2).len(), 2);
        assert_eq!(line.tail(10).len(), 3);
        assert!(RsLine::default().tail(5).is_empty());
    }
}
