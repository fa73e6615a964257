use statrs::distribution::{ContinuousCDF, Normal};

fn standard_normal() -> Normal {
    Normal::standard()
}

pub fn normal_cdf(x: f64) -> f64 {
    standard_normal().cdf(x)
}

/// Upper tail P(Z > x), computed directly to keep precision for large x
pub fn normal_sf(x: f64) -> f64 {
    standard_normal().sf(x)
}

pub fn normal_quantile(p: f64) -> f64 {
    standard_normal().inverse_cdf(p)
}

/// Two-sided critical value z such that P(|Z| > z) = 1 - confidence_level.
pub fn two_sided_critical(confidence_level: f64) -> f64 {
    normal_quantile(1.0 - (1.0 - confidence_level) / 2.0)
}

/// Percentile of sorted data with linear interpolation between order statistics.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let index = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lower = index.floor() as usize;
            let upper = index.ceil() as usize;
            let weight = index - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * weight
        }
    }
}

/// Cohen's h between two proportions (p2 relative to p1)
pub fn cohens_h(p1: f64, p2: f64) -> f64 {
    2.0 * p2.sqrt().asin() - 2.0 * p1.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_quantiles() {
        assert!((two_sided_critical(0.95) - 1.959964).abs() < 1e-6);
        assert!((normal_quantile(0.8) - 0.841621).abs() < 1e-6);
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_sf_keeps_tail_precision() {
        let tail = normal_sf(6.0);
        assert!(tail > 9.0e-10 && tail < 1.0e-9);
    }

    #[test]
    fn test_percentile_interpolates() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile_sorted(&data, 0.0), 1.0);
        assert_eq!(percentile_sorted(&data, 1.0), 5.0);
        assert_eq!(percentile_sorted(&data, 0.5), 3.0);
        assert!((percentile_sorted(&data, 0.1) - 1.4).abs() < 1e-12);
        assert!(percentile_sorted(&[], 0.5).is_nan());
    }

    #[test]
    fn test_cohens_h() {
        assert_eq!(cohens_h(0.3, 0.3), 0.0);
        let h = cohens_h(0.10, 0.13);
        assert!((h - 0.094225).abs() < 1e-5);
        assert!(cohens_h(0.13, 0.10) < 0.0);
    }
}
