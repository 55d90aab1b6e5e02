//! The toy single-bus system: one source, one sink, two flow-limit rules
//!
//! Stages run in order: construct the energy system, attach the custom
//! constraints, solve, extract results. Plotting is left to the caller.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::{Validate, ValidationError};

use crate::config::Config;
use crate::domain::{Bus, EnergySystem, Flow, Sequence, Sink, Source, TimeIndex};
use crate::error::ModelError;
use crate::optimizer::{
    ConstraintRule, FlowSelector, MaxFlowFraction, MinFlowFraction, OperationalModel, SolverSettings, SolverType,
};
use crate::results::Results;

/// Hourly demand shape, as a fraction of the sink's nominal value
const DEFAULT_DEMAND_PROFILE: [f64; 24] = [
    0.30, 0.30, 0.30, 0.30, 0.35, 0.45, 0.60, 0.75, 0.80, 0.75, 0.70, 0.70, 0.70, 0.65, 0.65, 0.70, 0.75, 0.85,
    0.90, 0.90, 0.80, 0.65, 0.50, 0.40,
];

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ScenarioConfig {
    pub start: DateTime<FixedOffset>,
    #[validate(range(min = 1))]
    pub timesteps: usize,
    /// At most one year
    #[validate(range(min = 1, max = 525600))]
    pub step_minutes: i64,

    #[validate(length(min = 1))]
    pub bus_label: String,
    #[validate(length(min = 1))]
    pub source_label: String,
    #[validate(length(min = 1))]
    pub sink_label: String,

    #[validate(range(min = 0.0))]
    pub source_nominal_value: f64,
    pub source_variable_costs: Sequence,
    #[validate(range(min = 0.0))]
    pub sink_nominal_value: f64,
    /// Fixed sink flow as a fraction of `sink_nominal_value`; repeats daily
    /// when shorter than the time index
    #[validate(length(min = 1))]
    pub demand_profile: Vec<f64>,

    #[validate(custom(function = "unit_fraction"))]
    pub voltage_min_fraction: Sequence,
    #[validate(custom(function = "unit_fraction"))]
    pub current_max_fraction: Sequence,
}

fn unit_fraction(fraction: &Sequence) -> Result<(), ValidationError> {
    if fraction.all_finite() && fraction.within(0.0, 1.0) {
        Ok(())
    } else {
        Err(ValidationError::new("fraction_out_of_range"))
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            start: DateTime::from_timestamp(1_325_376_000, 0)
                .unwrap_or_default()
                .fixed_offset(),
            timesteps: 24,
            step_minutes: 60,
            bus_label: "electricity".to_string(),
            source_label: "generator".to_string(),
            sink_label: "demand".to_string(),
            source_nominal_value: 100.0,
            source_variable_costs: Sequence::Scalar(25.0),
            sink_nominal_value: 80.0,
            demand_profile: DEFAULT_DEMAND_PROFILE.to_vec(),
            voltage_min_fraction: Sequence::Scalar(0.2),
            current_max_fraction: Sequence::Scalar(0.8),
        }
    }
}

impl ScenarioConfig {
    pub fn timeindex(&self) -> Result<TimeIndex> {
        let step = chrono::Duration::try_minutes(self.step_minutes).ok_or_else(|| {
            ModelError::InvalidTimeIndex(format!("step of {} minutes is out of range", self.step_minutes))
        })?;
        Ok(TimeIndex::new(self.start, step, self.timesteps)?)
    }

    /// Demand profile stretched or cut to the time index length
    pub fn demand_fix(&self) -> Vec<f64> {
        self.demand_profile
            .iter()
            .copied()
            .cycle()
            .take(self.timesteps)
            .collect()
    }
}

/// Stage 1: one bus, a source feeding it and a sink drawing from it
pub fn build_energy_system(scenario: &ScenarioConfig) -> Result<EnergySystem> {
    let mut es = EnergySystem::new(scenario.timeindex()?);

    let bus = Bus::new(&scenario.bus_label);
    let source = Source::new(&scenario.source_label).output(
        &bus,
        Flow::new()
            .nominal_value(scenario.source_nominal_value)
            .variable_costs(scenario.source_variable_costs.clone()),
    );
    let sink = Sink::new(&scenario.sink_label).input(
        &bus,
        Flow::new()
            .nominal_value(scenario.sink_nominal_value)
            .fix(scenario.demand_fix()),
    );

    es.add(bus)?;
    es.add(source)?;
    es.add(sink)?;
    Ok(es)
}

/// Stage 2 rules: both limit the source-to-bus flow
pub fn custom_rules(scenario: &ScenarioConfig) -> Vec<Box<dyn ConstraintRule>> {
    let supply = FlowSelector::edge(&scenario.source_label, &scenario.bus_label);
    vec![
        Box::new(MinFlowFraction::new(supply.clone(), scenario.voltage_min_fraction.clone())),
        Box::new(MaxFlowFraction::new(supply, scenario.current_max_fraction.clone())),
    ]
}

/// Resolve the configured solver, failing before any model is built when the
/// backend is not compiled in
pub fn solver_settings(cfg: &Config) -> Result<SolverSettings> {
    let solver = SolverType::parse(&cfg.solver.name)?;
    if !solver.is_available() {
        return Err(ModelError::SolverUnavailable(solver.to_string()).into());
    }
    Ok(SolverSettings {
        solver,
        tee: cfg.solver.tee,
        time_limit_seconds: cfg.solver.time_limit_seconds,
    })
}

/// Construct, constrain, solve and extract
pub fn run(cfg: &Config) -> Result<Results> {
    let scenario = &cfg.scenario;
    let settings = solver_settings(cfg)?;

    let es = build_energy_system(scenario).context("building energy system")?;
    info!(nodes = es.nodes().len(), timesteps = es.timeindex.len(), "energy system built");

    let mut model = OperationalModel::new(&es).context("building model")?;
    info!(variables = model.variable_count(), "model built");
    for rule in custom_rules(scenario) {
        model.add_rule(rule);
    }
    info!(rules = ?model.rule_names(), "custom constraints attached");

    let results = model
        .solve(&settings)
        .with_context(|| format!("solving with {}", settings.solver))?;
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_scenario_is_valid() {
        let scenario = ScenarioConfig::default();
        assert!(scenario.validate().is_ok());
        assert_eq!(scenario.start.to_rfc3339(), "2012-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_demand_profile_repeats() {
        let scenario = ScenarioConfig {
            timesteps: 5,
            demand_profile: vec![0.1, 0.2],
            ..ScenarioConfig::default()
        };
        assert_eq!(scenario.demand_fix(), vec![0.1, 0.2, 0.1, 0.2, 0.1]);
    }

    #[test]
    fn test_energy_system_layout() {
        let es = build_energy_system(&ScenarioConfig::default()).unwrap();
        assert_eq!(es.nodes().len(), 3);
        let edges: Vec<_> = es.flows().iter().map(|e| (e.source, e.target)).collect();
        assert_eq!(edges, vec![("generator", "electricity"), ("electricity", "demand")]);
    }

    #[test]
    fn test_rules_target_supply_flow() {
        let rules = custom_rules(&ScenarioConfig::default());
        let names: Vec<_> = rules.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["voltage_min", "current_max"]);
    }

    #[test]
    fn test_fraction_outside_unit_interval_fails_validation() {
        let scenario = ScenarioConfig {
            current_max_fraction: Sequence::Series(vec![0.8, 1.2]),
            ..ScenarioConfig::default()
        };
        let errors = scenario.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("current_max_fraction"));
    }

    #[test]
    fn test_huge_step_is_an_error_not_a_panic() {
        let scenario = ScenarioConfig {
            step_minutes: i64::MAX / 2,
            ..ScenarioConfig::default()
        };
        let errors = scenario.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("step_minutes"));
        assert!(scenario.timeindex().is_err());
        assert!(build_energy_system(&scenario).is_err());
    }

    #[test]
    fn test_horizon_past_date_range_is_an_error() {
        let scenario = ScenarioConfig {
            step_minutes: 525_600,
            timesteps: 1_000_000,
            ..ScenarioConfig::default()
        };
        assert!(scenario.validate().is_ok());
        let err = scenario.timeindex().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ModelError>(),
            Some(ModelError::InvalidTimeIndex(_))
        ));
    }

    #[test]
    fn test_unavailable_solver_fails_before_building() {
        let mut cfg = Config::default();
        cfg.solver.name = "cbc".to_string();
        assert_eq!(solver_settings(&cfg).is_ok(), cfg!(feature = "cbc"));
        cfg.solver.name = "minilp".to_string();
        assert_eq!(solver_settings(&cfg).unwrap().solver, SolverType::Minilp);
    }

    #[test]
    fn test_zero_timesteps_fail_validation() {
        let scenario = ScenarioConfig {
            timesteps: 0,
            ..ScenarioConfig::default()
        };
        assert!(scenario.validate().is_err());
    }
}
