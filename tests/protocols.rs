use qkd_sim::errors::SimulationError;
use qkd_sim::noise::TSIRELSON_BOUND;
use qkd_sim::protocols::{b92, bb84, e91};
use qkd_sim::{BellState, Detection, RandomSource, SimulationResponse, Verdict};

fn bb84_params(n_bits: usize, seed: u64) -> bb84::Bb84Params {
    bb84::Bb84Params {
        n_bits,
        seed: Some(seed),
        ..bb84::Bb84Params::default()
    }
}

fn e91_params(n_pairs: usize, seed: u64) -> e91::E91Params {
    e91::E91Params {
        n_pairs,
        seed: Some(seed),
        ..e91::E91Params::default()
    }
}

fn b92_params(n_signals: usize, seed: u64) -> b92::B92Params {
    b92::B92Params {
        n_signals,
        seed: Some(seed),
        ..b92::B92Params::default()
    }
}

#[test]
fn same_seed_reproduces_every_protocol() {
    let noisy_bb84 = bb84::Bb84Params {
        depolarization: 0.05,
        phase_damping: 0.02,
        fiber_length: 10.0,
        eavesdropping_rate: 0.1,
        ..bb84_params(500, 9)
    };
    assert_eq!(bb84::run(&noisy_bb84).unwrap(), bb84::run(&noisy_bb84).unwrap());

    let noisy_e91 = e91::E91Params {
        depolarization: 0.1,
        dark_count_rate: 0.01,
        ..e91_params(500, 9)
    };
    assert_eq!(e91::run(&noisy_e91).unwrap(), e91::run(&noisy_e91).unwrap());

    let noisy_b92 = b92::B92Params {
        channel_loss: 0.2,
        eavesdropping_rate: 0.3,
        ..b92_params(500, 9)
    };
    assert_eq!(b92::run(&noisy_b92).unwrap(), b92::run(&noisy_b92).unwrap());
}

#[test]
fn explicit_random_source_matches_seeded_run() {
    let params = b92_params(300, 17);
    let mut rng = RandomSource::seeded(17);
    assert_eq!(b92::run_with(&params, &mut rng).unwrap(), b92::run(&params).unwrap());
}

#[test]
fn noiseless_bb84_has_no_errors() {
    let result = bb84::run(&bb84_params(5000, 1)).unwrap();
    assert_eq!(result.statistics.qber, 0.0);
    assert!(result.keys_match);
    assert_eq!(result.verdict, Verdict::Secure);
    assert!((result.statistics.key_rate - 0.5).abs() < 0.05);
}

#[test]
fn four_bit_bb84_run_is_consistent() {
    let result = bb84::run(&bb84::Bb84Params::default()).unwrap();
    assert_eq!(result.alice_bits.len(), 4);
    assert_eq!(result.outcomes.len(), 4);
    assert_eq!(result.job_id, "sim_0_4");
    for outcome in &result.outcomes {
        let i = outcome.index;
        assert_eq!(
            outcome.sifted,
            result.alice_bases[i] == result.bob_bases[i],
            "signal {} sifted flag disagrees with bases",
            i
        );
    }
    assert_eq!(result.sifted.alice, result.sifted.bob);
}

#[test]
fn total_loss_yields_empty_keys() {
    let lossy_bb84 = bb84::Bb84Params {
        amplitude_damping: 1.0,
        ..bb84_params(200, 2)
    };
    let result = bb84::run(&lossy_bb84).unwrap();
    assert!(result.sifted.is_empty());
    assert_eq!(result.detected_count, 0);
    assert!(
        result
            .outcomes
            .iter()
            .all(|o| o.detection == Detection::NoDetection)
    );

    let lossy_b92 = b92::B92Params {
        channel_loss: 1.0,
        ..b92_params(200, 2)
    };
    let result = b92::run(&lossy_b92).unwrap();
    assert!(result.sifted.is_empty());
    assert_eq!(result.statistics.key_rate, 0.0);
}

#[test]
fn noiseless_singlet_violates_bell_inequality() {
    let result = e91::run(&e91_params(20000, 7)).unwrap();
    assert!(
        (result.chsh_s_value - TSIRELSON_BOUND).abs() < 0.15,
        "S = {}",
        result.chsh_s_value
    );
    assert!(result.bell_violated);
    assert_eq!(result.statistics.qber, 0.0);
    assert_eq!(result.verdict, Verdict::Secure);
}

#[test]
fn fully_depolarized_pairs_lose_the_violation() {
    let params = e91::E91Params {
        depolarization: 1.0,
        ..e91_params(6000, 3)
    };
    let result = e91::run(&params).unwrap();
    assert!(result.chsh_s_value.abs() < 2.0);
    assert!(!result.bell_violated);
    assert_eq!(result.verdict, Verdict::Critical);
}

#[test]
fn rotation_invariant_bell_states_give_error_free_keys() {
    for bell_state in [BellState::PsiMinus, BellState::PhiPlus] {
        let params = e91::E91Params {
            bell_state,
            ..e91_params(3000, 11)
        };
        let result = e91::run(&params).unwrap();
        assert_eq!(result.statistics.errors, 0, "{}", bell_state);
    }
}

#[test]
fn e91_partitions_pairs_between_subsets() {
    let result = e91::run(&e91_params(1000, 42)).unwrap();
    assert_eq!(result.bell_test_count + result.key_gen_count, 1000);
    assert_eq!(result.alice_bases.len(), 1000);
    for &i in &result.key_gen_indices {
        assert_eq!(result.alice_bases[i], result.bob_bases[i]);
    }
    for &i in &result.bell_test_indices {
        assert_ne!(result.alice_bases[i], result.bob_bases[i]);
    }
}

#[test]
fn noiseless_b92_yields_a_quarter_of_signals() {
    let result = b92::run(&b92_params(5000, 42)).unwrap();
    let yield_fraction = result.conclusive_count as f64 / 5000.0;
    assert!((yield_fraction - 0.25).abs() < 0.03, "yield {}", yield_fraction);
    assert_eq!(result.statistics.qber, 0.0);
    assert_eq!(result.verdict, Verdict::Secure);
}

#[test]
fn rates_stay_in_unit_interval_at_extremes() {
    let bb84 = bb84::run(&bb84::Bb84Params {
        depolarization: 1.0,
        phase_damping: 1.0,
        eavesdropping_rate: 1.0,
        ..bb84_params(1000, 4)
    })
    .unwrap();
    let e91 = e91::run(&e91::E91Params {
        depolarization: 1.0,
        eavesdropping_rate: 1.0,
        dark_count_rate: 1.0,
        ..e91_params(1000, 4)
    })
    .unwrap();
    let b92 = b92::run(&b92::B92Params {
        depolarization: 1.0,
        eavesdropping_rate: 1.0,
        dark_count_rate: 1.0,
        ..b92_params(1000, 4)
    })
    .unwrap();

    for stats in [bb84.statistics, e91.statistics, b92.statistics] {
        assert!((0.0..=1.0).contains(&stats.qber));
        assert!((0.0..=1.0).contains(&stats.key_rate));
    }
    assert!((0.0..=1.0).contains(&e91.expected_qber));
    assert!((0.0..=1.0).contains(&b92.expected_key_rate));
}

#[test]
fn invalid_parameters_are_rejected_before_running() {
    let err = b92::run(&b92::B92Params {
        dark_count_rate: -0.1,
        ..b92_params(10, 0)
    })
    .unwrap_err();
    assert_eq!(err.kind(), "invalid_parameters");

    let err = bb84::run(&bb84::Bb84Params {
        fiber_length: f64::NAN,
        ..bb84_params(10, 0)
    })
    .unwrap_err();
    assert!(matches!(err, SimulationError::InvalidParameters(_)));
}

#[test]
fn response_envelope_wraps_results() {
    let params = b92_params(100, 5);
    let response = SimulationResponse::from_result(b92::run(&params), |r| {
        Some(qkd_sim::statistics::report::b92_analysis(r))
    });
    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["params"]["n_signals"], 100);
    assert!(json["data"]["qber"].is_number());
    assert!(json["analysis"].as_str().unwrap().contains("B92 Protocol Analysis"));

    let failed = SimulationResponse::from_result(
        e91::run(&e91::E91Params {
            depolarization: 3.0,
            ..e91_params(10, 0)
        }),
        |_| None,
    );
    let json = serde_json::to_value(&failed).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["error_kind"], "invalid_parameters");
}

#[test]
fn params_load_from_partial_json() {
    let params: e91::E91Params =
        serde_json::from_str(r#"{"n_pairs": 250, "bell_state": "phi_plus"}"#).unwrap();
    assert_eq!(params.n_pairs, 250);
    assert_eq!(params.bell_state, BellState::PhiPlus);
    assert_eq!(params.seed, None);
    assert_eq!(params.depolarization, 0.0);
}
