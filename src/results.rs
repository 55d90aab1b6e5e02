//! Solved flow time series and per-node views

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::TimeIndex;
use crate::optimizer::SolverType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSeries {
    pub source: String,
    pub target: String,
    pub values: Vec<f64>,
}

impl FlowSeries {
    pub fn label(&self) -> String {
        format!("{} → {}", self.source, self.target)
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Flows entering and leaving one node
#[derive(Debug, Clone, Serialize)]
pub struct NodeView<'a> {
    pub label: String,
    pub inputs: Vec<&'a FlowSeries>,
    pub outputs: Vec<&'a FlowSeries>,
}

impl<'a> NodeView<'a> {
    pub fn sequences(&self) -> impl Iterator<Item = &'a FlowSeries> + '_ {
        self.inputs.iter().chain(self.outputs.iter()).copied()
    }

    /// Sum of inflows minus sum of outflows at timestep `t`
    pub fn net_at(&self, t: usize) -> f64 {
        let inflow: f64 = self.inputs.iter().filter_map(|f| f.values.get(t)).sum();
        let outflow: f64 = self.outputs.iter().filter_map(|f| f.values.get(t)).sum();
        inflow - outflow
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "ResultsRecord")]
pub struct Results {
    pub run_id: Uuid,
    pub solved_at: DateTime<Utc>,
    pub solver: SolverType,
    pub objective: f64,
    pub timeindex: TimeIndex,
    /// Ordered by (source, target)
    flows: Vec<FlowSeries>,
}

/// Decoded form of [`Results`]; converted through [`Results::new`] so flows
/// come back sorted
#[derive(Deserialize)]
struct ResultsRecord {
    run_id: Uuid,
    solved_at: DateTime<Utc>,
    solver: SolverType,
    objective: f64,
    timeindex: TimeIndex,
    flows: Vec<FlowSeries>,
}

impl From<ResultsRecord> for Results {
    fn from(r: ResultsRecord) -> Self {
        Results::new(r.run_id, r.solved_at, r.solver, r.objective, r.timeindex, r.flows)
    }
}

impl Results {
    pub fn new(
        run_id: Uuid,
        solved_at: DateTime<Utc>,
        solver: SolverType,
        objective: f64,
        timeindex: TimeIndex,
        mut flows: Vec<FlowSeries>,
    ) -> Self {
        flows.sort_by(|a, b| (&a.source, &a.target).cmp(&(&b.source, &b.target)));
        Self {
            run_id,
            solved_at,
            solver,
            objective,
            timeindex,
            flows,
        }
    }

    pub fn flows(&self) -> &[FlowSeries] {
        &self.flows
    }

    pub fn flow(&self, source: &str, target: &str) -> Option<&FlowSeries> {
        self.flows
            .binary_search_by(|f| (f.source.as_str(), f.target.as_str()).cmp(&(source, target)))
            .ok()
            .map(|i| &self.flows[i])
    }

    /// `None` when no flow starts or ends at `label`
    pub fn node_view(&self, label: &str) -> Option<NodeView<'_>> {
        let inputs: Vec<&FlowSeries> = self.flows.iter().filter(|f| f.target == label).collect();
        let outputs: Vec<&FlowSeries> = self.flows.iter().filter(|f| f.source == label).collect();
        if inputs.is_empty() && outputs.is_empty() {
            return None;
        }
        Some(NodeView {
            label: label.to_string(),
            inputs,
            outputs,
        })
    }

    pub fn timestamps(&self) -> Vec<DateTime<FixedOffset>> {
        self.timeindex.timestamps()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
