//! End-to-end runs of the single-bus scenario on the pure-Rust backend.

use bus_dispatch::config::Config;
use bus_dispatch::domain::{Bus, EnergySystem, Flow, Sequence, Sink, Source, TimeIndex};
use bus_dispatch::optimizer::{
    FlowSelector, MaxFlowFraction, MinFlowFraction, OperationalModel, SolverSettings, SolverType,
};
use bus_dispatch::scenario::{self, ScenarioConfig};
use bus_dispatch::ModelError;
use chrono::DateTime;
use proptest::prelude::*;

const EPS: f64 = 1e-6;

fn minilp_config(scenario: ScenarioConfig) -> Config {
    let mut cfg = Config::default();
    cfg.solver.name = "minilp".to_string();
    cfg.scenario = scenario;
    cfg
}

#[test]
fn default_scenario_respects_flow_limits() {
    let cfg = minilp_config(ScenarioConfig::default());
    let results = scenario::run(&cfg).unwrap();

    let supply = results.flow("generator", "electricity").unwrap();
    let demand = results.flow("electricity", "demand").unwrap();
    assert_eq!(supply.values.len(), 24);

    for (s, d) in supply.values.iter().zip(&demand.values) {
        assert!(*s >= 20.0 - EPS && *s <= 80.0 + EPS, "supply {} outside [20, 80]", s);
        assert!((s - d).abs() < EPS, "bus out of balance: {} vs {}", s, d);
    }

    // 25 per unit over an hourly index
    let expected = demand.sum() * 25.0;
    assert!((results.objective - expected).abs() < 1e-4);
    assert_eq!(results.solver, SolverType::Minilp);
}

#[test]
fn bus_view_lists_both_flows() {
    let results = scenario::run(&minilp_config(ScenarioConfig::default())).unwrap();
    let view = results.node_view("electricity").unwrap();
    assert_eq!(view.inputs.len(), 1);
    assert_eq!(view.outputs.len(), 1);
    for t in 0..24 {
        assert!(view.net_at(t).abs() < EPS);
    }
    assert!(results.node_view("heat").is_none());
}

#[test]
fn current_limit_below_peak_demand_is_infeasible() {
    let cfg = minilp_config(ScenarioConfig {
        current_max_fraction: Sequence::Scalar(0.5),
        ..ScenarioConfig::default()
    });
    let err = scenario::run(&cfg).unwrap_err();
    assert!(
        matches!(err.downcast_ref::<ModelError>(), Some(ModelError::Infeasible)),
        "unexpected error: {:#}",
        err
    );
}

#[test]
fn voltage_limit_above_night_demand_is_infeasible() {
    let cfg = minilp_config(ScenarioConfig {
        voltage_min_fraction: Sequence::Scalar(0.5),
        ..ScenarioConfig::default()
    });
    assert!(scenario::run(&cfg).is_err());
}

#[test]
fn per_timestep_fractions_from_config() {
    let mut max = vec![0.8; 24];
    max[18] = 0.7;
    max[19] = 0.7;
    let cfg = minilp_config(ScenarioConfig {
        sink_nominal_value: 70.0,
        current_max_fraction: Sequence::Series(max),
        ..ScenarioConfig::default()
    });
    let results = scenario::run(&cfg).unwrap();
    let supply = results.flow("generator", "electricity").unwrap();
    // demand at 18:00 is 0.9 * 70 = 63, under the 70 cap
    assert!((supply.values[18] - 63.0).abs() < EPS);
}

#[test]
fn unknown_solver_is_reported() {
    let mut cfg = minilp_config(ScenarioConfig::default());
    cfg.solver.name = "glpk".to_string();
    let err = scenario::run(&cfg).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ModelError>(),
        Some(ModelError::UnknownSolver(name)) if name == "glpk"
    ));
}

#[test]
fn duplicate_supply_edge_cannot_bypass_current_limit() {
    let start = DateTime::parse_from_rfc3339("2012-01-01T00:00:00+00:00").unwrap();
    let mut es = EnergySystem::new(TimeIndex::hourly(start, 1).unwrap());
    let bus = Bus::new("el");
    es.add(bus.clone()).unwrap();
    es.add(
        Source::new("gen")
            .output(&bus, Flow::new().nominal_value(100.0))
            .output(&bus, Flow::new().nominal_value(100.0)),
    )
    .unwrap();
    es.add(Sink::new("load").input(&bus, Flow::new().nominal_value(100.0).fix(1.0)))
        .unwrap();

    let err = OperationalModel::new(&es).err().unwrap();
    assert!(matches!(err, ModelError::DuplicateFlow { ref from, ref to } if from == "gen" && to == "el"));
}

#[test]
fn default_solver_is_cbc() {
    let cfg = Config::default();
    assert_eq!(cfg.solver.name, "cbc");
    let result = scenario::run(&cfg);
    if cfg!(feature = "cbc") {
        assert_eq!(result.unwrap().solver, SolverType::Cbc);
    } else {
        assert!(matches!(
            result.unwrap_err().downcast_ref::<ModelError>(),
            Some(ModelError::SolverUnavailable(name)) if name == "cbc"
        ));
    }
}

#[cfg(not(feature = "cbc"))]
#[test]
fn cbc_without_feature_is_unavailable() {
    let mut cfg = minilp_config(ScenarioConfig::default());
    cfg.solver.name = "cbc".to_string();
    let err = scenario::run(&cfg).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ModelError>(),
        Some(ModelError::SolverUnavailable(_))
    ));
}

#[cfg(feature = "cbc")]
#[test]
fn cbc_matches_minilp() {
    let lp = scenario::run(&minilp_config(ScenarioConfig::default())).unwrap();
    let mut cfg = minilp_config(ScenarioConfig::default());
    cfg.solver.name = "cbc".to_string();
    let cbc = scenario::run(&cfg).unwrap();
    assert!((lp.objective - cbc.objective).abs() < 1e-4);
}

/// Generator with a free excess sink and an expensive backup, so any
/// fraction pair with min <= max is feasible
fn flexible_system(demand: &[f64]) -> EnergySystem {
    let start = DateTime::parse_from_rfc3339("2012-01-01T00:00:00+00:00").unwrap();
    let mut es = EnergySystem::new(TimeIndex::hourly(start, demand.len()).unwrap());
    let bus = Bus::new("el");
    es.add(bus.clone()).unwrap();
    es.add(Source::new("gen").output(&bus, Flow::new().nominal_value(100.0).variable_costs(1.0)))
        .unwrap();
    es.add(Source::new("backup").output(&bus, Flow::new().variable_costs(50.0)))
        .unwrap();
    es.add(Sink::new("load").input(&bus, Flow::new().nominal_value(100.0).fix(demand.to_vec())))
        .unwrap();
    es.add(Sink::new("excess").input(&bus, Flow::new())).unwrap();
    es
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn solved_flows_respect_fractions(
        lo in 0.0f64..=1.0,
        spread in 0.0f64..=1.0,
        demand in prop::collection::vec(0.0f64..=1.0, 1..6),
    ) {
        let hi = (lo + (1.0 - lo) * spread).min(1.0);
        let es = flexible_system(&demand);
        let mut model = OperationalModel::new(&es).unwrap();
        model.add_rule(Box::new(MinFlowFraction::new(FlowSelector::edge("gen", "el"), lo)));
        model.add_rule(Box::new(MaxFlowFraction::new(FlowSelector::edge("gen", "el"), hi)));

        let results = model.solve(&SolverSettings::with_solver(SolverType::Minilp)).unwrap();
        let gen = results.flow("gen", "el").unwrap();
        for v in &gen.values {
            prop_assert!(*v >= lo * 100.0 - 1e-5);
            prop_assert!(*v <= hi * 100.0 + 1e-5);
        }
        for t in 0..demand.len() {
            prop_assert!(results.node_view("el").unwrap().net_at(t).abs() < 1e-5);
        }
    }
}
