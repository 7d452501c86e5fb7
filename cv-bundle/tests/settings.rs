use cv_bundle::{AlignMethod, BundleSettings, LossFunctionKind, OrientationPrior};

#[test]
fn intrinsic_priors_follow_settings() {
    let settings = BundleSettings {
        exif_focal_sd: 0.5,
        radial_distortion_k3_sd: 0.25,
        ..Default::default()
    };
    let sd = settings.intrinsics_prior_sd();
    assert_eq!(sd.focal, 0.5);
    assert_eq!(sd.k3, 0.25);
    assert_eq!(sd.principal_point, 0.01);
}

#[cfg(feature = "serde-serialize")]
mod serialization {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let settings: BundleSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, BundleSettings::default());
    }

    #[test]
    fn names_match_configuration_files() {
        let settings: BundleSettings = serde_json::from_str(
            r#"{
                "loss_function": "CauchyLoss",
                "align_method": "orientation_prior",
                "align_orientation_prior": "no_roll",
                "local_bundle_max_shots": 12
            }"#,
        )
        .unwrap();
        assert_eq!(settings.loss_function, LossFunctionKind::Cauchy);
        assert_eq!(settings.align_method, AlignMethod::OrientationPrior);
        assert_eq!(settings.align_orientation_prior, OrientationPrior::NoRoll);
        assert_eq!(settings.local_bundle_max_shots, 12);
        assert_eq!(settings.local_bundle_radius, 3);

        let json = serde_json::to_value(BundleSettings::default()).unwrap();
        assert_eq!(json["loss_function"], "SoftLOneLoss");
        assert_eq!(json["align_method"], "auto");
    }
}
