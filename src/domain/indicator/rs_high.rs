//! RS-Line new high over the trailing window.

use crate::domain::rs_line::RsLine;

/// True when the latest RS-Line value is at or above every other value in
/// the trailing `window` points. False when fewer than `window` exist.
pub fn is_rs_line_high(rs_line: &RsLine, window: usize) -> bool {
    if window < 2 || rs_line.len() < window {
        return false;
    }
    let tail = rs_line.tail(window);
    let Some((latest, prior)) = tail.split_last() else {
        return false;
    };
    let prior_max = prior
        .iter()
        .map(|p| p.value)
        .fold(f64::NEG_INFINITY, f64::max);
    latest.value >= prior_max
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn line(values: &[f64]) -> RsLine {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let dates: Vec<NaiveDate> = (0..values.len())
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect();
        RsLine::from_aligned(&dates, values, &vec![1.0; values.len()])
    }

    #[test]
    fn false_below_window() {
        let values: Vec<f64> = (1..=251).map(f64::from).collect();
        assert!(!is_rs_line_high(&line(&values), 252));
    }

    #[test]
    fn strictly_above_prior_is_high() {
        let mut values = vec![1.0; 251];
        values.push(1.5);
        assert!(is_rs_line_high(&line(&values), 252));
    }

    #[test]
    fn equal_to_prior_max_counts() {
        let mut values = vec![1.0; 251];
        values[100] = 2.0;
        values.push(2.0);
        assert!(is_rs_line_high(&line(&values), 252));
    }

    #[test]
    fn below_prior_max_is_not_high() {
        let mut values = vec![1.0; 251];
        values[10] = 3.0;
        values.push(2.0);
        assert!(!is_rs_line_high(&line(&values), 252));
    }

    #[test]
    fn old_peaks_outside_window_are_ignored() {
        let mut values = vec![9.0; 10];
        values.extend(std::iter::repeat_n(1.0, 251));
        values.push(1.1);
        assert!(is_rs_line_high(&line(&values), 252));
    }
}
