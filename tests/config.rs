extern crate pretty_env_logger as pel;
extern crate twobody;

use nalgebra::Vector3;
use rstest::*;

use twobody::constants::MU_EARTH;
use twobody::orbital::{propagate_batch, propagate_with};
use twobody::{ConversionConfig, OrbitalElements, SolverConfig, StateVector};

#[test]
fn solver_config_from_partial_toml() {
    let cfg: SolverConfig = toml::from_str("max_iterations = 10").unwrap();
    assert_eq!(cfg.max_iterations, 10);
    assert_eq!(cfg.rel_tol, SolverConfig::default().rel_tol);
    assert_eq!(cfg.lagrange_tol, SolverConfig::default().lagrange_tol);

    let cfg: SolverConfig = toml::from_str("").unwrap();
    assert_eq!(cfg, SolverConfig::default());
}

#[test]
fn conversion_config_from_toml() {
    let cfg: ConversionConfig = toml::from_str(
        r#"
        tol = 1e-8
        resolve_degenerate = false
        "#,
    )
    .unwrap();
    assert_eq!(cfg.tol, 1e-8);
    assert!(!cfg.resolve_degenerate);

    let serialized = toml::to_string(&ConversionConfig::default()).unwrap();
    let back: ConversionConfig = toml::from_str(&serialized).unwrap();
    assert_eq!(back, ConversionConfig::default());
}

#[test]
fn invalid_config_is_a_domain_error() {
    let _ = pel::try_init();
    let cfg: SolverConfig = toml::from_str("max_iterations = 0").unwrap();
    let state = StateVector::new(Vector3::new(7000.0, 0.0, 0.0), Vector3::new(0.0, 7.5, 0.0));
    let err = propagate_with(MU_EARTH, &state, 60.0, &cfg).unwrap_err();
    assert!(err.is_domain(), "{err}");

    let cfg = ConversionConfig::with_tol(f64::NAN);
    let elem = OrbitalElements::circular(7000.0, 0.3);
    assert!(elem.to_state(MU_EARTH, &cfg).unwrap_err().is_domain());
}

#[rstest]
#[case(1e-12)]
#[case(1e-9)]
fn batch_matches_single_propagation(#[case] rel_tol: f64) {
    let cfg = SolverConfig {
        rel_tol,
        ..SolverConfig::default()
    };
    let states: Vec<StateVector> = [(7_000.0, 0.0), (9_000.0, 0.2), (20_000.0, 0.5), (-15_000.0, 1.3)]
        .iter()
        .map(|&(sma, ecc)| {
            OrbitalElements::new(sma, ecc, 0.4, 1.0, 2.0, 0.5)
                .to_state(MU_EARTH, &ConversionConfig::default())
                .unwrap()
        })
        .collect();

    let batch = propagate_batch(MU_EARTH, &states, 3_600.0, &cfg);
    assert_eq!(batch.len(), states.len());
    for (state, result) in states.iter().zip(batch) {
        let single = propagate_with(MU_EARTH, state, 3_600.0, &cfg).unwrap();
        assert_eq!(result.unwrap(), single);
    }
}
