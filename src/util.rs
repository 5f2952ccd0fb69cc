pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

pub fn std_dev(data: &[f64]) -> Option<f64> {
    match (mean(data), data.len()) {
        (Some(data_mean), count) if count > 0 => {
            let variance = data
                .iter()
                .map(|value| {
                    let diff = data_mean - *value;

                    diff * diff
                })
                .sum::<f64>()
                / count as f64;

            Some(variance.sqrt())
        }
        _ => None,
    }
}

/// Least-squares slope of evenly spaced values (x = 0, 1, 2, ...).
/// Returns 0.0 when there are fewer than two points.
pub fn linear_trend(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }

    let nf = n as f64;
    let sum_x = nf * (nf - 1.0) / 2.0;
    let sum_y = values.iter().sum::<f64>();
    let sum_xy = values
        .iter()
        .enumerate()
        .map(|(x, y)| x as f64 * y)
        .sum::<f64>();
    let sum_xx = nf * (nf - 1.0) * (2.0 * nf - 1.0) / 6.0;

    let denominator = nf * sum_xx - sum_x * sum_x;
    if denominator == 0.0 {
        return 0.0;
    }

    (nf * sum_xy - sum_x * sum_y) / denominator
}
