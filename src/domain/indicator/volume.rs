//! Volume surge: latest volume over the trailing average.

/// `current / mean(last window volumes)`, where the window includes the
/// current bar. `None` when the history is shorter than `window` or the
/// average is zero.
pub fn volume_surge(volumes: &[i64], window: usize) -> Option<f64> {
    if window == 0 || volumes.len() < window {
        return None;
    }
    let recent = &volumes[volumes.len() - window..];
    let average = recent.iter().map(|v| *v as f64).sum::<f64>() / window as f64;
    if average == 0.0 {
        return None;
    }
    let current = *volumes.last()? as f64;
    Some(current / average)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steady_volume_is_one() {
        assert_eq!(volume_surge(&[500; 60], 50), Some(1.0));
    }

    #[test]
    fn spike_on_last_bar() {
        let mut volumes = vec![1_000; 50];
        volumes[49] = 5_900;
        // mean = (49 * 1000 + 5900) / 50 = 1098
        let surge = volume_surge(&volumes, 50).unwrap();
        assert!((surge - 5_900.0 / 1_098.0).abs() < 1e-12);
    }

    #[test]
    fn undefined_when_short_or_zero() {
        assert_eq!(volume_surge(&[100; 49], 50), None);
        assert_eq!(volume_surge(&[0; 50], 50), None);
    }
}
