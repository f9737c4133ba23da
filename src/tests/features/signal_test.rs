#[cfg(test)]
mod tests {
    use crate::features::signal::{
        compute_signal_features, FeatureVersion, SignalParams, HH_L3_WEIGHT, MI_DIR_L5_WEIGHT,
    };

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_v2_features() {
        let features =
            compute_signal_features(&[100.0, 200.0, 3.0, 4.0], &SignalParams::default()).unwrap();

        assert!(close(features.hphp_mean, 153.5));
        assert!(close(features.hphp_weight, 153.5 * 153.5));
        assert!(close(features.hphp_magnitude, 153.5));
        assert!(close(features.hphp_std, 0.0));
        assert!(close(features.mi_dir_l5_weight, 4f64.ln()));
        assert!(features.hh_l3_weight > 0.0);
        assert!(features.hh_l001_weight > 0.0);

        assert_eq!(features.max, 200.0);
        assert_eq!(features.min, 3.0);
        assert!(close(features.mean, 76.75));
    }

    #[test]
    fn test_v1_features() {
        let params = SignalParams {
            version: FeatureVersion::V1,
            ..SignalParams::default()
        };
        let features = compute_signal_features(&[100.0, 200.0, 3.0, 4.0], &params).unwrap();

        assert!(close(features.hphp_weight, 50025.0));
        assert!(close(features.hphp_mean, 153.5));
        assert!(features.hh_l3_weight > 0.0 && features.hh_l3_weight < 4f64.ln());
        // Σ p^0.01 over four shares, each just under 1
        assert!(features.hh_l001_weight > 3.8 && features.hh_l001_weight < 4.0);
    }

    #[test]
    fn test_short_signal_is_padded_but_statistics_are_not() {
        let features = compute_signal_features(&[7.0, 1.0], &SignalParams::default()).unwrap();

        assert!(close(features.hphp_mean, 4.0));
        assert_eq!(features.max, 7.0);
        assert_eq!(features.min, 1.0);
        assert!(close(features.mean, 4.0));
        assert!(close(features.stddev, 3.0));
    }

    #[test]
    fn test_named_order() {
        let features =
            compute_signal_features(&[1.0, 2.0, 3.0, 4.0], &SignalParams::default()).unwrap();
        let names: Vec<&str> = features.named().iter().map(|(name, _)| *name).collect();

        assert_eq!(names.len(), 7);
        assert_eq!(names[0], MI_DIR_L5_WEIGHT);
        assert_eq!(names[1], HH_L3_WEIGHT);
    }

    #[test]
    fn test_signal_errors() {
        assert!(compute_signal_features(&[], &SignalParams::default()).is_err());
        assert!(compute_signal_features(&[1.0, f64::NAN], &SignalParams::default()).is_err());
    }

    #[test]
    fn test_version_names() {
        assert_eq!(FeatureVersion::V2.to_string(), "v2");
        assert_eq!("v1".parse::<FeatureVersion>().unwrap(), FeatureVersion::V1);
    }
}
