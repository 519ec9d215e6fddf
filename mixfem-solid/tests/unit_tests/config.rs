use matrixcompare::assert_scalar_eq;
use mixfem_solid::config::{MaterialConfig, MixedElasticityConfig};
use mixfem_solid::NewtonSettings;

#[test]
fn parse_config_with_defaults() {
    let json = r#"
        {
            "material": {
                "young_modulus": 3.0,
                "poisson_ratio": 0.5
            }
        }
    "#;
    let config: MixedElasticityConfig<f64> = serde_json::from_str(json).unwrap();
    assert_eq!(config.material, MaterialConfig::new(3.0, 0.5));
    assert_eq!(config.newton, NewtonSettings::default());
    assert!(config.validate().is_ok());

    let parameters = config.material.elasticity_parameters();
    assert_scalar_eq!(parameters.lame.mu, 1.0, comp = float);
    assert_eq!(parameters.lame.lambda, f64::INFINITY);
    assert_eq!(parameters.density, 1.0);
    assert_eq!(parameters.time_factor, 1.0);
}

#[test]
fn parse_full_config() {
    let json = r#"
        {
            "material": {
                "young_modulus": 2.6,
                "poisson_ratio": 0.3,
                "density": 2.0,
                "time_factor": 0.25
            },
            "newton": {
                "max_iterations": 20,
                "tolerance": 1e-8
            }
        }
    "#;
    let config: MixedElasticityConfig<f64> = serde_json::from_str(json).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.newton.max_iterations, 20);
    assert_eq!(config.newton.tolerance, 1e-8);

    let parameters = config.material.elasticity_parameters();
    assert_eq!(parameters.density, 2.0);
    assert_eq!(parameters.time_factor, 0.25);
    assert_scalar_eq!(parameters.lame.lambda, 1.5, comp = abs, tol = 1e-14);

    let serialized = serde_json::to_string(&config).unwrap();
    let deserialized: MixedElasticityConfig<f64> = serde_json::from_str(&serialized).unwrap();
    assert_eq!(deserialized, config);
}

#[test]
fn invalid_config_is_rejected() {
    assert!(MaterialConfig::new(1.0, 0.6).validate().is_err());
    assert!(MaterialConfig::new(1.0, -1.0).validate().is_err());
    // A vanishing lambda leaves the pressure penalty undefined
    assert!(MaterialConfig::new(1.0, 0.0).validate().is_err());
    assert!(MaterialConfig::new(1.0, -0.2).validate().is_err());
    assert!(MaterialConfig::new(-1.0, 0.3).validate().is_err());

    let config = MixedElasticityConfig {
        material: MaterialConfig::new(1.0, 0.3),
        newton: NewtonSettings {
            max_iterations: 0,
            tolerance: 1e-10,
        },
    };
    assert!(config.validate().is_err());

    let config = MixedElasticityConfig {
        newton: NewtonSettings {
            max_iterations: 10,
            tolerance: 0.0,
        },
        ..config
    };
    assert!(config.validate().is_err());
}
