//! Leader rule: strong RS score with price and averages stacked in order.
//!
//! score > leader_min_score AND P[-1] > SMA(short) AND SMA(short) > SMA(long)

use crate::domain::indicator::IndicatorSettings;
use crate::domain::indicator::sma::simple_moving_average;

pub fn is_leader(prices: &[f64], rs_score: u8, settings: &IndicatorSettings) -> bool {
    if rs_score <= settings.leader_min_score {
        return false;
    }
    let (Some(short), Some(long), Some(current)) = (
        simple_moving_average(prices, settings.sma_short),
        simple_moving_average(prices, settings.sma_long),
        prices.last().copied(),
    ) else {
        return false;
    };
    current > short && short > long
}
