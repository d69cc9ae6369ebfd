//! Summary statistics over calibrated series.

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by N, not N - 1).
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    let variance = values.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// Largest absolute value, returned as a magnitude.
pub fn peak_abs(values: &[f64]) -> Option<f64> {
    values.iter().map(|v| v.abs()).fold(None, |peak, v| match peak {
        Some(p) if p >= v => Some(p),
        _ => Some(v),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_formula() {
        let values = [10.0, 20.0, 30.0];
        assert_eq!(mean(&values), Some(20.0));
        let sd = population_std_dev(&values).unwrap();
        assert_eq!(format!("{sd:.2}"), "8.16");
    }

    #[test]
    fn single_value_has_zero_spread() {
        assert_eq!(population_std_dev(&[4.2]), Some(0.0));
    }

    #[test]
    fn empty_input_has_no_statistics() {
        assert_eq!(mean(&[]), None);
        assert_eq!(population_std_dev(&[]), None);
        assert_eq!(peak_abs(&[]), None);
    }

    #[test]
    fn peak_uses_absolute_value() {
        assert_eq!(peak_abs(&[-5.2, 3.1, 4.9]), Some(5.2));
        assert_eq!(peak_abs(&[1.0, -0.5]), Some(1.0));
    }
}
