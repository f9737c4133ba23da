#[cfg(test)]
mod tests {
    use crate::features::mutual_info::{discretize, mutual_information};

    #[test]
    fn test_identical_series_share_their_entropy() {
        let series = [1, 2, 1, 2];
        let mi = mutual_information(&series, &series).unwrap();
        assert!((mi - 2f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_independent_series() {
        let mi = mutual_information(&[0, 0, 1, 1], &[0, 1, 0, 1]).unwrap();
        assert_eq!(mi, 0.0);
    }

    #[test]
    fn test_positions_against_distinct_values() {
        let positions = [0i64, 1, 2, 3];
        let values = discretize(&[100.2, 199.7, 3.0, 4.4]);
        assert_eq!(values, vec![100, 200, 3, 4]);
        let mi = mutual_information(&positions, &values).unwrap();
        assert!((mi - 4f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_mutual_information_errors() {
        assert!(mutual_information(&[1, 2], &[1]).is_err());
        assert!(mutual_information::<i64>(&[], &[]).is_err());
    }
}
