pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (ddof = 0).
pub fn population_std(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// `true` for every value whose absolute z-score is strictly below
/// `threshold`. With fewer than two values or zero spread there is nothing
/// to measure against, so every value is kept.
pub fn zscore_retain_mask(values: &[f64], threshold: f64) -> Vec<bool> {
    let (Some(m), Some(std)) = (mean(values), population_std(values)) else {
        return Vec::new();
    };

    if values.len() < 2 || std == 0.0 || !std.is_finite() {
        return vec![true; values.len()];
    }

    values
        .iter()
        .map(|v| ((v - m) / std).abs() < threshold)
        .collect()
}
