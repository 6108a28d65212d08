use crate::error::AnalyticsError;

/// Arithmetic mean.
pub fn mean(x: &[f64]) -> Result<f64, AnalyticsError> {
    if x.is_empty() {
        return Err(AnalyticsError::EmptyInput("mean"));
    }
    Ok(x.iter().sum::<f64>() / x.len() as f64)
}

/// Sample variance (divisor `n - 1`).
pub fn variance(x: &[f64]) -> Result<f64, AnalyticsError> {
    if x.len() < 2 {
        return Err(AnalyticsError::InsufficientData {
            metric: "variance",
            required: 2,
            actual: x.len(),
        });
    }
    let m = mean(x)?;
    let sum_sq: f64 = x.iter().map(|v| (v - m) * (v - m)).sum();
    Ok(sum_sq / (x.len() - 1) as f64)
}

/// Sample standard deviation.
pub fn std_dev(x: &[f64]) -> Result<f64, AnalyticsError> {
    variance(x).map(f64::sqrt)
}

/// Sample covariance (divisor `n - 1`) of two equally long series.
pub fn covariance(a: &[f64], b: &[f64]) -> Result<f64, AnalyticsError> {
    if a.len() != b.len() {
        return Err(AnalyticsError::LengthMismatch {
            metric: "covariance",
            left: a.len(),
            right: b.len(),
        });
    }
    if a.len() < 2 {
        return Err(AnalyticsError::InsufficientData {
            metric: "covariance",
            required: 2,
            actual: a.len(),
        });
    }
    let mean_a = mean(a)?;
    let mean_b = mean(b)?;
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum();
    Ok(sum / (a.len() - 1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_of_empty_is_an_error() {
        assert_eq!(mean(&[]), Err(AnalyticsError::EmptyInput("mean")));
        assert_relative_eq!(mean(&[1.0, 2.0, 3.0, 4.0]).unwrap(), 2.5);
    }

    #[test]
    fn variance_uses_the_unbiased_divisor() {
        // Deviations from 5 are -3,-1,-1,-1,0,0,2,4 -> sum of squares 32, n - 1 = 7.
        let x = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_relative_eq!(variance(&x).unwrap(), 32.0 / 7.0);
        assert_relative_eq!(std_dev(&x).unwrap(), (32.0f64 / 7.0).sqrt());
    }

    #[test]
    fn variance_is_never_negative() {
        let series: [&[f64]; 4] = [
            &[0.0, 0.0],
            &[1e-9, -1e-9, 3e-9],
            &[1e6, -1e6, 5.0, 0.25, -7.5],
            &[0.01, -0.02, 0.015, 0.005, 0.0, 0.02, -0.01, 0.03, -0.005, 0.01],
        ];
        for x in series {
            assert!(variance(x).unwrap() >= 0.0);
        }
    }

    #[test]
    fn variance_needs_two_points() {
        assert!(matches!(
            variance(&[1.0]),
            Err(AnalyticsError::InsufficientData { actual: 1, .. })
        ));
    }

    #[test]
    fn covariance_of_a_series_with_itself_is_its_variance() {
        let x = [0.3, -0.1, 0.25, 0.0, 0.8];
        assert_relative_eq!(covariance(&x, &x).unwrap(), variance(&x).unwrap());
    }

    #[test]
    fn covariance_sign_follows_co_movement() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [8.0, 6.0, 4.0, 2.0];
        assert_relative_eq!(covariance(&a, &b).unwrap(), -10.0 / 3.0);
    }

    #[test]
    fn covariance_rejects_mismatched_or_short_input() {
        assert!(matches!(
            covariance(&[1.0, 2.0], &[1.0, 2.0, 3.0]),
            Err(AnalyticsError::LengthMismatch { left: 2, right: 3, .. })
        ));
        assert!(matches!(
            covariance(&[1.0], &[2.0]),
            Err(AnalyticsError::InsufficientData { .. })
        ));
    }
}
