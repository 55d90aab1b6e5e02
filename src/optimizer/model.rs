//! Linear operational model of an energy system
//!
//! One continuous variable per (source, target, period, timestep) with bounds
//! taken from the flow parameters. Balanced buses get
//! `sum(inflows) == sum(outflows)` at every timestep. The objective is
//! `sum(variable_costs[t] * flow * timeincrement)`.

use chrono::Utc;
use good_lp::{constraint, variable, Constraint, Expression, ProblemVariables, Variable};
use itertools::iproduct;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::constraints::ConstraintRule;
use super::solver::{solve_problem, SolverSettings};
use crate::domain::{EnergySystem, Flow, TimeIndex};
use crate::error::ModelResult;
use crate::results::{FlowSeries, Results};

/// Index of a single flow variable
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FlowKey {
    pub source: String,
    pub target: String,
    pub period: usize,
    pub timestep: usize,
}

/// Variables of one directed flow, one per timestep
#[derive(Debug, Clone)]
pub struct EdgeVariables {
    pub source: String,
    pub target: String,
    pub flow: Flow,
    pub(crate) variables: Vec<Variable>,
}

impl EdgeVariables {
    pub fn variable(&self, timestep: usize) -> Option<Variable> {
        self.variables.get(timestep).copied()
    }

    pub fn matches(&self, source: &str, target: &str) -> bool {
        self.source == source && self.target == target
    }
}

/// Read-only view handed to constraint rules
pub struct ModelView<'a> {
    timeindex: &'a TimeIndex,
    edges: &'a [EdgeVariables],
}

impl<'a> ModelView<'a> {
    pub fn timeindex(&self) -> &TimeIndex {
        self.timeindex
    }

    pub fn periods(&self) -> std::ops::Range<usize> {
        0..1
    }

    pub fn edges(&self) -> &[EdgeVariables] {
        self.edges
    }

    pub fn edge(&self, source: &str, target: &str) -> Option<&EdgeVariables> {
        self.edges.iter().find(|e| e.matches(source, target))
    }

    /// Every (source, target, period, timestep) index of the model
    pub fn flow_keys(&self) -> impl Iterator<Item = FlowKey> + 'a {
        let periods = self.periods();
        let len = self.timeindex.len();
        self.edges
            .iter()
            .flat_map(move |edge| edge_keys(edge, periods.clone(), len))
    }

    pub fn keys_of<'e>(&self, edge: &'e EdgeVariables) -> impl Iterator<Item = FlowKey> + 'e {
        edge_keys(edge, self.periods(), self.timeindex.len())
    }

    pub fn variable(&self, key: &FlowKey) -> Option<Variable> {
        if !self.periods().contains(&key.period) {
            return None;
        }
        self.edge(&key.source, &key.target)
            .and_then(|e| e.variable(key.timestep))
    }
}

fn edge_keys(
    edge: &EdgeVariables,
    periods: std::ops::Range<usize>,
    len: usize,
) -> impl Iterator<Item = FlowKey> + '_ {
    iproduct!(periods, 0..len).map(move |(period, timestep)| FlowKey {
        source: edge.source.clone(),
        target: edge.target.clone(),
        period,
        timestep,
    })
}

/// Operational dispatch model built from an [`EnergySystem`]
pub struct OperationalModel<'a> {
    system: &'a EnergySystem,
    problem: ProblemVariables,
    edges: Vec<EdgeVariables>,
    rules: Vec<Box<dyn ConstraintRule>>,
}

impl<'a> OperationalModel<'a> {
    pub fn new(system: &'a EnergySystem) -> ModelResult<Self> {
        system.validate()?;

        let mut problem = ProblemVariables::new();
        let n = system.timeindex.len();
        let mut edges = Vec::new();

        for edge in system.flows() {
            let variables = (0..n)
                .map(|t| {
                    let bounds = edge.flow.bounds_at(t);
                    let mut def = variable().min(bounds.lower);
                    if let Some(upper) = bounds.upper {
                        def = def.max(upper);
                    }
                    problem.add(def)
                })
                .collect();

            edges.push(EdgeVariables {
                source: edge.source.to_string(),
                target: edge.target.to_string(),
                flow: edge.flow.clone(),
                variables,
            });
        }

        debug!(edges = edges.len(), timesteps = n, "flow variables created");

        Ok(Self {
            system,
            problem,
            edges,
            rules: Vec::new(),
        })
    }

    /// Register an extra constraint rule, applied at solve time
    pub fn add_rule(&mut self, rule: Box<dyn ConstraintRule>) {
        debug!(rule = rule.name(), "constraint rule registered");
        self.rules.push(rule);
    }

    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn view(&self) -> ModelView<'_> {
        ModelView {
            timeindex: &self.system.timeindex,
            edges: &self.edges,
        }
    }

    pub fn variable_count(&self) -> usize {
        self.edges.iter().map(|e| e.variables.len()).sum()
    }

    fn balance_constraints(&self) -> Vec<Constraint> {
        let mut constraints = Vec::new();
        for bus in self.system.buses().filter(|b| b.balanced) {
            let inflows: Vec<&EdgeVariables> = self.edges.iter().filter(|e| e.target == bus.label).collect();
            let outflows: Vec<&EdgeVariables> = self.edges.iter().filter(|e| e.source == bus.label).collect();
            if inflows.is_empty() && outflows.is_empty() {
                continue;
            }

            for t in 0..self.system.timeindex.len() {
                let supply: Expression = inflows.iter().map(|e| e.variables[t]).sum();
                let demand: Expression = outflows.iter().map(|e| e.variables[t]).sum();
                constraints.push(constraint!(supply == demand));
            }
        }
        constraints
    }

    fn objective(&self) -> Expression {
        let dt = self.system.timeindex.timeincrement();
        self.edges
            .iter()
            .flat_map(|edge| {
                edge.variables
                    .iter()
                    .enumerate()
                    .map(move |(t, var)| (edge.flow.cost_at(t) * dt, *var))
            })
            .filter(|(weight, _)| *weight != 0.0)
            .map(|(weight, var)| weight * var)
            .sum()
    }

    /// Balance constraints followed by every registered rule, in order
    pub fn constraints(&self) -> ModelResult<Vec<Constraint>> {
        let mut constraints = self.balance_constraints();
        let view = self.view();
        for rule in &self.rules {
            let built = rule.build(&view)?;
            debug!(rule = rule.name(), count = built.len(), "rule constraints built");
            constraints.extend(built);
        }
        Ok(constraints)
    }

    /// Solve the model, blocking until the solver returns
    pub fn solve(self, settings: &SolverSettings) -> ModelResult<Results> {
        let constraints = self.constraints()?;
        let objective = self.objective();
        let wanted: Vec<Variable> = self.edges.iter().flat_map(|e| e.variables.iter().copied()).collect();

        info!(
            solver = %settings.solver,
            variables = wanted.len(),
            constraints = constraints.len(),
            "solving model"
        );

        let values = solve_problem(self.problem, objective, constraints, &wanted, settings)?;

        let n = self.system.timeindex.len();
        let dt = self.system.timeindex.timeincrement();
        let mut objective_value = 0.0;
        let mut flows = Vec::with_capacity(self.edges.len());
        for (edge, chunk) in self.edges.iter().zip(values.chunks(n)) {
            objective_value += chunk
                .iter()
                .enumerate()
                .map(|(t, v)| edge.flow.cost_at(t) * dt * v)
                .sum::<f64>();
            flows.push(FlowSeries {
                source: edge.source.clone(),
                target: edge.target.clone(),
                values: chunk.to_vec(),
            });
        }

        info!(objective = objective_value, "model solved");

        Ok(Results::new(
            Uuid::new_v4(),
            Utc::now(),
            settings.solver,
            objective_value,
            self.system.timeindex.clone(),
            flows,
        ))
    }
}
