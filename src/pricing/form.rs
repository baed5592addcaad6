//! Rate and form helpers feeding the pricing factors

/// Default decay for goal-based form
pub const GOALSCORER_DECAY: f64 = 0.025;
/// Default decay for assist-based form; assists are noisier so memory is longer
pub const ASSIST_DECAY: f64 = 0.017;

/// Per-90-minute rate, rounded to 3 decimals
pub fn per_90(stat: f64, minutes: f64) -> f64 {
    if minutes <= 0.0 || !stat.is_finite() {
        return 0.0;
    }
    ((stat / minutes) * 90.0 * 1000.0).round() / 1000.0
}

/// Exponentially-decayed form factor
///
/// # Arguments
/// * `recent_values` - Per-match values, most recent first
/// * `decay` - Decay rate; match `i` gets weight e^(-decay·i)
/// * `baseline` - Expected average; the plain mean of the values when `None`
///
/// # Returns
/// Weighted average over baseline (1.0 = neutral). Empty input or a
/// non-positive baseline yields 1.0.
pub fn calculate_form_factor(recent_values: &[f64], decay: f64, baseline: Option<f64>) -> f64 {
    if recent_values.is_empty() {
        return 1.0;
    }

    let baseline =
        baseline.unwrap_or_else(|| recent_values.iter().sum::<f64>() / recent_values.len() as f64);
    if !baseline.is_finite() || baseline <= 0.0 {
        return 1.0;
    }

    let (weighted_sum, total_weight) = recent_values.iter().enumerate().fold(
        (0.0, 0.0),
        |(sum, total), (i, &value)| {
            let weight = (-decay * i as f64).exp();
            (sum + value * weight, total + weight)
        },
    );

    if total_weight <= 0.0 {
        return 1.0;
    }

    (weighted_sum / total_weight) / baseline
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_90() {
        assert_eq!(per_90(10.0, 900.0), 1.0);
        assert_eq!(per_90(3.2, 1000.0), 0.288);
        assert_eq!(per_90(5.0, 0.0), 0.0);
    }

    #[test]
    fn test_form_factor_empty_is_neutral() {
        assert_eq!(calculate_form_factor(&[], GOALSCORER_DECAY, None), 1.0);
    }

    #[test]
    fn test_form_factor_flat_series_is_neutral() {
        let factor = calculate_form_factor(&[0.4, 0.4, 0.4, 0.4], GOALSCORER_DECAY, None);
        assert!((factor - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_form_factor_rewards_recent_improvement() {
        // Most recent first
        let hot = calculate_form_factor(&[0.9, 0.6, 0.3, 0.1], 0.5, None);
        let cold = calculate_form_factor(&[0.1, 0.3, 0.6, 0.9], 0.5, None);
        assert!(hot > 1.0);
        assert!(cold < 1.0);
    }

    #[test]
    fn test_form_factor_with_baseline() {
        let factor = calculate_form_factor(&[0.6, 0.6], ASSIST_DECAY, Some(0.3));
        assert!((factor - 2.0).abs() < 1e-12);
        assert_eq!(calculate_form_factor(&[0.6], ASSIST_DECAY, Some(0.0)), 1.0);
    }

    #[test]
    fn test_zero_decay_is_plain_mean() {
        let factor = calculate_form_factor(&[1.0, 0.0], 0.0, Some(0.25));
        assert!((factor - 2.0).abs() < 1e-12);
    }
}
