/// Simple Moving Average over trailing windows of close prices.

/// SMA of the last `window` values, or `None` with insufficient history.
pub fn sma(values: &[f64], window: usize) -> Option<f64> {
    if window == 0 || values.len() < window {
        return None;
    }
    let sum: f64 = values[values.len() - window..].iter().sum();
    Some(sum / window as f64)
}

/// SMA aligned to the input: one entry per value, `None` until the window
/// is complete.
pub fn sma_series(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    let mut out = Vec::with_capacity(values.len());
    let mut running = 0.0;
    for (i, &v) in values.iter().enumerate() {
        running += v;
        if i + 1 < window {
            out.push(None);
        } else {
            if i + 1 > window {
                running -= values[i - window];
            }
            out.push(Some(running / window as f64));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_of_exact_window() {
        let prices = vec![100.0, 102.0, 104.0, 106.0, 108.0];
        assert_eq!(sma(&prices, 5), Some(104.0));
    }

    #[test]
    fn sma_uses_trailing_values() {
        let prices = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(sma(&prices, 2), Some(3.5));
    }

    #[test]
    fn sma_insufficient_history() {
        let prices = vec![100.0, 102.0];
        assert!(sma(&prices, 5).is_none());
    }

    #[test]
    fn series_aligns_with_input() {
        let prices = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let series = sma_series(&prices, 3);
        assert_eq!(series.len(), 5);
        assert_eq!(series[0], None);
        assert_eq!(series[1], None);
        assert_eq!(series[2], Some(2.0));
        assert_eq!(series[3], Some(3.0));
        assert_eq!(series[4], Some(4.0));
    }

    #[test]
    fn series_tail_matches_scalar() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64).sin()).collect();
        let series = sma_series(&prices, 50);
        let tail = series.last().unwrap().unwrap();
        let scalar = sma(&prices, 50).unwrap();
        assert!((tail - scalar).abs() < 1e-9);
    }
}
