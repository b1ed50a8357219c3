use crate::{
    extract_bridges, normalize_rows, standard_scenarios, scenarios_from_json, BaseAffinity,
    BridgeMatrix, Preset, ResonanceModel, ScenarioSpec, SimulationConfig, SimulationError, State,
    TransitionMatrix, TransitionModel, ZoneVisit, ROW_SUM_TOLERANCE,
};

fn visit(player: &str, minute: f64, zone: &str) -> ZoneVisit {
    ZoneVisit {
        player_id: player.into(),
        timestamp: minute * 60.0,
        zone: zone.into(),
    }
}

fn assert_row_stochastic(matrix: &TransitionMatrix) {
    for state in State::ALL {
        let sum: f64 = matrix.row(state).iter().sum();
        assert!((sum - 1.0).abs() < ROW_SUM_TOLERANCE, "row {state} sums to {sum}");
    }
}

#[test]
fn state_indices_are_fixed() {
    for (i, state) in State::ALL.iter().enumerate() {
        assert_eq!(state.index(), i);
        assert_eq!(State::from_index(i), Some(*state));
    }
    assert_eq!(State::from_index(4), None);
    assert_eq!("Horizon".parse::<State>(), Ok(State::Horizon));
    assert!("Lobby".parse::<State>().is_err());
}

#[test]
fn standard_scenarios_build_stochastic_matrices() {
    let model = TransitionModel::default();
    for (name, scenario) in standard_scenarios(500).unwrap() {
        let matrix = model.build(&scenario.bridge).unwrap();
        assert_row_stochastic(&matrix);
        assert!(matrix.degenerate_states().is_empty(), "{name}");
    }
}

#[test]
fn uniform_bridge_leaves_base_distribution_unchanged() {
    let model = TransitionModel::default();
    let ones = model.build(&BridgeMatrix::ones()).unwrap();
    let damped = model.build(&BridgeMatrix::uniform(0.9).unwrap()).unwrap();
    for state in State::ALL {
        for (a, b) in ones.row(state).iter().zip(damped.row(state)) {
            assert!((a - b).abs() < 1e-12);
        }
    }
    assert!((ones.probability(State::Forge, State::Forge) - 0.55).abs() < 1e-12);
}

#[test]
fn weak_bridges_dampen_forge_to_back() {
    let model = TransitionModel::default();
    let baseline = model.build(&ScenarioSpec::baseline().bridge).unwrap();
    let weak = model.build(&ScenarioSpec::weak_bridges().unwrap().bridge).unwrap();
    assert!(
        weak.probability(State::Forge, State::Back) < baseline.probability(State::Forge, State::Back)
    );
    assert!(
        weak.probability(State::Horizon, State::Forge)
            < baseline.probability(State::Horizon, State::Forge)
    );
    assert_row_stochastic(&weak);
}

#[test]
fn zero_row_is_rejected_with_source_state() {
    let bridge = BridgeMatrix::new([
        [1.0, 1.0, 1.0, 1.0],
        [1.0, 1.0, 1.0, 1.0],
        [0.0, 0.0, 0.0, 0.0],
        [1.0, 1.0, 1.0, 1.0],
    ])
    .unwrap();
    let err = TransitionModel::default().build(&bridge).unwrap_err();
    assert_eq!(err, SimulationError::DegenerateTransition { state: State::Back });
}

#[test]
fn normalize_rows_keeps_zero_rows_zero() {
    let normalized = normalize_rows(&[
        [2.0, 2.0, 0.0, 0.0],
        [0.0, 0.0, 0.0, 0.0],
        [1.0, 1.0, 1.0, 1.0],
        [0.0, 0.0, 0.0, 3.0],
    ]);
    assert_eq!(normalized[0], [0.5, 0.5, 0.0, 0.0]);
    assert_eq!(normalized[1], [0.0; 4]);
    assert_eq!(normalized[3], [0.0, 0.0, 0.0, 1.0]);
    assert!(normalized.iter().flatten().all(|p| p.is_finite()));
}

#[test]
fn sampler_follows_cumulative_rule() {
    let matrix = TransitionMatrix::from_normalized([
        [0.25, 0.25, 0.25, 0.25],
        [0.0, 1.0, 0.0, 0.0],
        [0.5, 0.0, 0.5, 0.0],
        [0.0, 0.0, 0.0, 0.0],
    ])
    .unwrap();

    assert_eq!(matrix.sample(State::Forge, 0.0).unwrap(), State::Forge);
    assert_eq!(matrix.sample(State::Forge, 0.2499).unwrap(), State::Forge);
    assert_eq!(matrix.sample(State::Forge, 0.25).unwrap(), State::Forge);
    assert_eq!(matrix.sample(State::Forge, 0.2501).unwrap(), State::Nexus);
    assert_eq!(matrix.sample(State::Forge, 0.9999).unwrap(), State::Horizon);
    // zero-probability categories are never picked, even for a zero draw
    assert_eq!(matrix.sample(State::Nexus, 0.0).unwrap(), State::Nexus);
    assert_eq!(matrix.sample(State::Back, 0.7).unwrap(), State::Back);
    // cumulative shortfall falls through to the last reachable category
    assert_eq!(matrix.sample(State::Back, 1.0 + 1e-12).unwrap(), State::Back);

    assert_eq!(
        matrix.sample(State::Horizon, 0.3).unwrap_err(),
        SimulationError::DegenerateTransition { state: State::Horizon }
    );
    assert_eq!(matrix.degenerate_states(), vec![State::Horizon]);
}

#[test]
fn from_normalized_rejects_unnormalized_rows() {
    let err = TransitionMatrix::from_normalized([
        [0.5, 0.5, 0.5, 0.0],
        [0.25; 4],
        [0.25; 4],
        [0.25; 4],
    ])
    .unwrap_err();
    assert!(matches!(err, SimulationError::Configuration { field: "transition_matrix", .. }));
}

#[test]
fn bridge_json_requires_four_by_four() {
    let bridge = BridgeMatrix::from_json("[[1,1,1,1],[1,1,1,1],[1,1,0.5,1],[1,1,1,1]]").unwrap();
    assert_eq!(bridge.get(State::Back, State::Back), 0.5);

    let round_trip = BridgeMatrix::from_json(&bridge.to_json_pretty().unwrap()).unwrap();
    assert_eq!(round_trip, bridge);

    for bad in [
        "[[1,1,1,1],[1,1,1,1],[1,1,1,1]]",
        "[[1,1,1],[1,1,1],[1,1,1],[1,1,1]]",
        "[[1,1,1,1],[1,1,1,1],[1,1,1,1],[1,1,1,-0.5]]",
    ] {
        let err = BridgeMatrix::from_json(bad).unwrap_err();
        assert!(
            matches!(err, SimulationError::Configuration { field: "bridge", .. }),
            "{bad}: {err}"
        );
    }
}

#[test]
fn base_affinity_rejects_negative_weights() {
    let mut rows = *BaseAffinity::standard().rows();
    rows[1][2] = -0.1;
    assert!(BaseAffinity::new(rows).is_err());
}

#[test]
fn presets_match_published_values() {
    let paper = Preset::Paper.config();
    assert_eq!((paper.population, paper.steps, paper.repetitions, paper.seed), (500, 500, 20, 42));
    assert_eq!((paper.alpha, paper.f_burn, paper.burn_window), (0.8, 0.8, 50));
    assert_eq!(paper.s_n, 5.0);

    let realistic: SimulationConfig = "realistic".parse::<Preset>().unwrap().config();
    assert_eq!((realistic.population, realistic.steps, realistic.repetitions), (1000, 1000, 5));
    assert_eq!((realistic.alpha, realistic.f_burn, realistic.burn_window), (0.03, 0.75, 10));
    assert_eq!(realistic.s_n, 0.05);
    assert_eq!(realistic.beta, paper.beta);

    assert!(paper.validate().is_ok());
    assert!(realistic.validate().is_ok());
    assert!("extreme".parse::<Preset>().is_err());
}

#[test]
fn validation_names_the_bad_field() {
    let cases: Vec<(&str, SimulationConfig)> = vec![
        ("population", SimulationConfig { population: 0, ..SimulationConfig::paper() }),
        ("burn_window", SimulationConfig { burn_window: 0, ..SimulationConfig::paper() }),
        ("f50", SimulationConfig { f50: 0.0, ..SimulationConfig::paper() }),
        ("m_max", SimulationConfig { m_max: -1.0, ..SimulationConfig::paper() }),
        ("repetitions", SimulationConfig { repetitions: 0, ..SimulationConfig::paper() }),
        ("alpha", SimulationConfig { alpha: f64::NAN, ..SimulationConfig::paper() }),
    ];
    for (expected, cfg) in cases {
        match cfg.validate() {
            Err(SimulationError::Configuration { field, .. }) => assert_eq!(field, expected),
            other => panic!("{expected}: unexpected {other:?}"),
        }
    }
}

#[test]
fn config_json_fills_model_constants() {
    let mut value = serde_json::to_value(SimulationConfig::realistic()).unwrap();
    let object = value.as_object_mut().unwrap();
    object.remove("noise_sd");
    object.remove("horizon_exposure");
    object.remove("initial");

    let cfg = SimulationConfig::from_json(&value.to_string()).unwrap();
    assert_eq!(cfg, SimulationConfig::realistic());
}

#[test]
fn resonance_multipliers_have_expected_shape() {
    let model = ResonanceModel::from_config(&SimulationConfig::paper());
    assert_eq!(model.fatigue_multiplier(0.0), 1.0);
    assert!((model.fatigue_multiplier(50.0) - 0.5).abs() < 1e-12);
    assert!(model.fatigue_multiplier(10.0) > model.fatigue_multiplier(20.0));
    assert!((model.motivation_multiplier(1.0) - 2.2).abs() < 1e-12);
    assert!((model.horizon_multiplier(0.7) - 1.7).abs() < 1e-12);

    let score = model.score(0.2, 0.0, 0.0, 0.0);
    assert!((score - 2.0).abs() < 1e-12);
}

#[test]
fn intervention_step_must_fall_inside_run() {
    let scenario = ScenarioSpec::intervention(100).unwrap();
    assert_eq!(scenario.intervention_step, Some(50));
    assert_eq!(scenario.boost_at(50), Some(0.2));
    assert_eq!(scenario.boost_at(51), None);
    assert!(scenario.validate(100).is_ok());
    assert!(matches!(
        scenario.validate(50),
        Err(SimulationError::Configuration { field: "intervention_step", .. })
    ));
}

#[test]
fn standard_scenarios_fit_a_zero_step_run() {
    let set = standard_scenarios(0).unwrap();
    assert_eq!(set["Intervention"].intervention_step, None);
    assert_eq!(set["Intervention"].bridge, BridgeMatrix::uniform(0.9).unwrap());
    assert!(set.values().all(|spec| spec.validate(0).is_ok()));

    let single = standard_scenarios(1).unwrap();
    assert_eq!(single["Intervention"].intervention_step, Some(0));
    assert!(single["Intervention"].validate(1).is_ok());
}

#[test]
fn scenario_file_parses_optional_fields() {
    let set = scenarios_from_json(
        r#"{
            "Calm": {"bridge": [[1,1,1,1],[1,1,1,1],[1,1,1,1],[1,1,1,1]]},
            "Boosted": {
                "bridge": [[0.9,0.9,0.9,0.9],[0.9,0.9,0.9,0.9],[0.9,0.9,0.9,0.9],[0.9,0.9,0.9,0.9]],
                "intervention_step": 10,
                "recovery_boost": 0.5,
                "seed": 7
            }
        }"#,
    )
    .unwrap();
    assert_eq!(set["Calm"], ScenarioSpec::baseline());
    assert_eq!(set["Boosted"].intervention_step, Some(10));
    assert_eq!(set["Boosted"].recovery_boost, 0.5);
    assert_eq!(set["Boosted"].seed, Some(7));
    assert!(scenarios_from_json(r#"{"Bad": {"bridge": [[1,1]]}}"#).is_err());
}

#[test]
fn bridges_follow_median_transition_interval() {
    let visits = vec![
        visit("p1", 0.0, "Forge"),
        visit("p1", 60.0, "Back"),
        visit("p1", 70.0, "Back"),
        visit("p1", 100.0, "Nexus"),
        visit("p2", 0.0, "Forge"),
        visit("p2", 120.0, "Back"),
        // out-of-order rows are sorted per player
        visit("p3", 30.0, "Back"),
        visit("p3", 0.0, "Forge"),
        visit("p3", 40.0, "Arcade"),
    ];
    let bridge = extract_bridges(&visits, 60.0).unwrap();

    // Forge->Back intervals: 60, 120, 30 minutes -> median 60
    assert!((bridge.get(State::Forge, State::Back) - 0.5).abs() < 1e-12);
    // Back->Nexus is measured from the last Back sample: 30 minutes
    assert!((bridge.get(State::Back, State::Nexus) - 1.0 / 1.5).abs() < 1e-12);
    assert_eq!(bridge.get(State::Nexus, State::Horizon), 1.0);
    assert_eq!(bridge.get(State::Back, State::Forge), 1.0);
}

#[test]
fn even_sample_median_averages_middle_values() {
    let visits = vec![
        visit("a", 0.0, "Horizon"),
        visit("a", 10.0, "Forge"),
        visit("b", 0.0, "Horizon"),
        visit("b", 30.0, "Forge"),
    ];
    let bridge = extract_bridges(&visits, 20.0).unwrap();
    assert!((bridge.get(State::Horizon, State::Forge) - 0.5).abs() < 1e-12);
}

#[test]
fn extraction_rejects_bad_inputs() {
    assert!(matches!(
        extract_bridges(&[], 0.0),
        Err(SimulationError::Configuration { field: "t0_minutes", .. })
    ));
    let visits = vec![visit("a", 0.0, "Forge"), visit("a", f64::NAN, "Back")];
    assert!(matches!(
        extract_bridges(&visits, 60.0),
        Err(SimulationError::Telemetry { record: 2, .. })
    ));
    assert_eq!(extract_bridges(&[], 60.0).unwrap(), BridgeMatrix::ones());
}
