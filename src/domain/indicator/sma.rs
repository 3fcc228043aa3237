//! Simple moving average and the distance of price from it.
//!
//! SMA(n) = mean of the last n prices.
//! Distance = (P[-1] - SMA(n)) / SMA(n) * 100.

/// `None` when fewer than `period` prices exist or `period` is zero.
pub fn simple_moving_average(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period {
        return None;
    }
    let window = &prices[prices.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

pub fn sma_distance_pct(prices: &[f64], period: usize) -> Option<f64> {
    let sma = simple_moving_average(prices, period)?;
    let current = *prices.last()?;
    if sma == 0.0 || !sma.is_finite() {
        return None;
    }
    Some((current - sma) / sma * 100.0)
}
