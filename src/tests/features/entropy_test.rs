#[cfg(test)]
mod tests {
    use crate::features::entropy::{
        density_histogram, histogram_entropy, shannon_entropy, HISTOGRAM_EPSILON,
    };

    #[test]
    fn test_density_histogram_integrates_to_one() {
        let values = [0.0, 1.0, 1.5, 2.0, 9.0, 10.0];
        for bins in [1, 3, 8, 100] {
            let density = density_histogram(&values, bins).unwrap();
            let width = 10.0 / bins as f64;
            let area: f64 = density.iter().map(|d| d * width).sum();
            assert_eq!(density.len(), bins);
            assert!((area - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_density_histogram_last_bin_is_closed() {
        let density = density_histogram(&[0.0, 0.0, 0.0, 4.0], 2).unwrap();
        assert_eq!(density, vec![0.375, 0.125]);
    }

    #[test]
    fn test_constant_signal_widens_range() {
        let density = density_histogram(&[5.0; 4], 8).unwrap();
        assert_eq!(density.iter().filter(|d| **d > 0.0).count(), 1);
        assert!((density[4] - 8.0).abs() < 1e-12);
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy(&[1.0, 1.0, 1.0, 1.0]).unwrap() - 4f64.ln()).abs() < 1e-12);
        assert_eq!(shannon_entropy(&[0.0, 3.0]).unwrap(), 0.0);
        assert!(shannon_entropy(&[0.0, 0.0]).is_err());
        assert!(shannon_entropy(&[-1.0, 2.0]).is_err());
    }

    #[test]
    fn test_histogram_entropy_reference_values() {
        let expected = -(0.75f64 * 0.75f64.ln() + 0.25 * 0.25f64.ln());
        let entropy = histogram_entropy(&[0.0, 0.0, 0.0, 4.0], 2, HISTOGRAM_EPSILON).unwrap();
        assert!((entropy - expected).abs() < 1e-6);

        let constant = histogram_entropy(&[5.0; 4], 8, HISTOGRAM_EPSILON).unwrap();
        assert!(constant >= 0.0 && constant < 1e-6);
    }

    #[test]
    fn test_histogram_errors() {
        assert!(density_histogram(&[], 8).is_err());
        assert!(density_histogram(&[1.0], 0).is_err());
        assert!(density_histogram(&[1.0, f64::INFINITY], 8).is_err());
    }
}
