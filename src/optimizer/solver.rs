//! Solver backends
//!
//! The model is handed to a `good_lp` backend chosen by name:
//! - `cbc`: COIN-OR CBC (requires the `cbc` cargo feature and libCbc)
//! - `minilp`: pure-Rust simplex, always available
//!
//! CBC honours the log switch and the time limit. minilp has neither and
//! ignores both.

use good_lp::{Constraint, Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumString};
use tracing::debug;

use crate::error::{ModelError, ModelResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SolverType {
    /// COIN-OR branch and cut
    Cbc,
    /// Pure-Rust simplex
    Minilp,
}

impl SolverType {
    pub fn parse(name: &str) -> ModelResult<Self> {
        SolverType::from_str(name.trim()).map_err(|_| ModelError::UnknownSolver(name.to_string()))
    }

    pub fn is_available(&self) -> bool {
        match self {
            SolverType::Cbc => cfg!(feature = "cbc"),
            SolverType::Minilp => true,
        }
    }
}

impl Default for SolverType {
    fn default() -> Self {
        SolverType::Cbc
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverSettings {
    pub solver: SolverType,
    /// Echo the solver's own log output
    pub tee: bool,
    pub time_limit_seconds: u64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            solver: SolverType::default(),
            tee: false,
            time_limit_seconds: 30,
        }
    }
}

impl SolverSettings {
    pub fn with_solver(solver: SolverType) -> Self {
        Self {
            solver,
            ..Self::default()
        }
    }
}

/// Minimise `objective` subject to `constraints` and return the values of
/// `wanted` in the same order
pub(crate) fn solve_problem(
    variables: ProblemVariables,
    objective: Expression,
    constraints: Vec<Constraint>,
    wanted: &[Variable],
    settings: &SolverSettings,
) -> ModelResult<Vec<f64>> {
    match settings.solver {
        SolverType::Cbc => solve_cbc(variables, objective, constraints, wanted, settings),
        SolverType::Minilp => {
            debug!(
                tee = settings.tee,
                time_limit_seconds = settings.time_limit_seconds,
                "minilp has no log or time limit options, ignoring"
            );
            let mut problem = variables.minimise(objective).using(good_lp::solvers::microlp::microlp);
            for constraint in constraints {
                problem = problem.with(constraint);
            }
            let solution = problem.solve().map_err(map_resolution_error)?;
            Ok(wanted.iter().map(|v| solution.value(*v)).collect())
        }
    }
}

#[cfg(feature = "cbc")]
fn solve_cbc(
    variables: ProblemVariables,
    objective: Expression,
    constraints: Vec<Constraint>,
    wanted: &[Variable],
    settings: &SolverSettings,
) -> ModelResult<Vec<f64>> {
    let mut problem = variables.minimise(objective).using(good_lp::solvers::coin_cbc::coin_cbc);
    problem.set_parameter("log", if settings.tee { "1" } else { "0" });
    problem.set_parameter("seconds", &settings.time_limit_seconds.to_string());
    for constraint in constraints {
        problem = problem.with(constraint);
    }
    let solution = problem.solve().map_err(map_resolution_error)?;
    Ok(wanted.iter().map(|v| solution.value(*v)).collect())
}

#[cfg(not(feature = "cbc"))]
fn solve_cbc(
    _variables: ProblemVariables,
    _objective: Expression,
    _constraints: Vec<Constraint>,
    _wanted: &[Variable],
    _settings: &SolverSettings,
) -> ModelResult<Vec<f64>> {
    Err(ModelError::SolverUnavailable("cbc".to_string()))
}

fn map_resolution_error(err: ResolutionError) -> ModelError {
    match err {
        ResolutionError::Infeasible => ModelError::Infeasible,
        ResolutionError::Unbounded => ModelError::Unbounded,
        other => ModelError::Solver(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("cbc", SolverType::Cbc)]
    #[case("CBC", SolverType::Cbc)]
    #[case(" minilp ", SolverType::Minilp)]
    #[case("MiniLP", SolverType::Minilp)]
    fn test_parse_solver_name(#[case] name: &str, #[case] expected: SolverType) {
        assert_eq!(SolverType::parse(name).unwrap(), expected);
    }

    #[test]
    fn test_unknown_solver_name() {
        assert!(matches!(
            SolverType::parse("gurobi"),
            Err(ModelError::UnknownSolver(name)) if name == "gurobi"
        ));
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        assert_eq!(SolverType::Cbc.to_string(), "cbc");
        assert_eq!(SolverType::parse(&SolverType::Minilp.to_string()).unwrap(), SolverType::Minilp);
    }

    #[test]
    fn test_default_is_cbc() {
        assert_eq!(SolverType::default(), SolverType::Cbc);
        assert_eq!(SolverSettings::default().solver, SolverType::Cbc);
    }

    #[test]
    fn test_minilp_always_available() {
        assert!(SolverType::Minilp.is_available());
        assert_eq!(SolverType::Cbc.is_available(), cfg!(feature = "cbc"));
    }

    #[cfg(not(feature = "cbc"))]
    #[test]
    fn test_cbc_unavailable_without_feature() {
        let settings = SolverSettings::with_solver(SolverType::Cbc);
        let result = solve_problem(
            ProblemVariables::new(),
            std::iter::empty::<Expression>().sum(),
            vec![],
            &[],
            &settings,
        );
        assert!(matches!(result, Err(ModelError::SolverUnavailable(_))));
    }
}
