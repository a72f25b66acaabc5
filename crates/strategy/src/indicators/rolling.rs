/// Trailing-window helpers shared by the volume and resistance conditions.

/// Rolling mean aligned to the input, `None` until the window is complete.
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
    crate::indicators::sma::sma_series(values, window)
}

/// Rolling max aligned to the input, `None` until the window is complete.
pub fn rolling_max(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            if i + 1 < window {
                None
            } else {
                values[i + 1 - window..=i]
                    .iter()
                    .copied()
                    .fold(f64::NEG_INFINITY, f64::max)
                    .into()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rolling_max_tracks_window() {
        let values = vec![1.0, 5.0, 3.0, 2.0, 4.0];
        let series = rolling_max(&values, 3);
        assert_eq!(series, vec![None, None, Some(5.0), Some(5.0), Some(4.0)]);
    }

    #[test]
    fn rolling_mean_matches_sma() {
        let values = vec![2.0, 4.0, 6.0, 8.0];
        let series = rolling_mean(&values, 2);
        assert_eq!(series, vec![None, Some(3.0), Some(5.0), Some(7.0)]);
    }
}
