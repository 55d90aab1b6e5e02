use good_lp::{constraint, Constraint};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::model::{EdgeVariables, ModelView};
use crate::domain::Sequence;
use crate::error::{ModelError, ModelResult};

/// Extra constraint attached to an [`OperationalModel`](super::OperationalModel)
pub trait ConstraintRule: Send + Sync {
    fn name(&self) -> &str;

    /// Build the rule's constraints against the model's variables
    fn build(&self, view: &ModelView<'_>) -> ModelResult<Vec<Constraint>>;
}

/// Which flows a rule applies to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowSelector {
    All,
    /// (source, target) pairs
    Edges(Vec<(String, String)>),
}

impl FlowSelector {
    pub fn edge(source: impl Into<String>, target: impl Into<String>) -> Self {
        FlowSelector::Edges(vec![(source.into(), target.into())])
    }

    fn select<'v>(&self, rule: &str, view: &'v ModelView<'_>) -> ModelResult<Vec<&'v EdgeVariables>> {
        match self {
            FlowSelector::All => Ok(view.edges().iter().collect()),
            FlowSelector::Edges(pairs) => pairs
                .iter()
                .map(|(source, target)| {
                    view.edge(source, target).ok_or_else(|| ModelError::InvalidRule {
                        rule: rule.to_string(),
                        message: format!("no flow {} -> {} in model", source, target),
                    })
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    AtLeast,
    AtMost,
}

/// Shared body of the two fraction rules:
/// `flow (>=|<=) fraction[t] * nominal_value` for every selected flow key
fn fraction_constraints(
    rule: &str,
    selector: &FlowSelector,
    fraction: &Sequence,
    direction: Direction,
    view: &ModelView<'_>,
) -> ModelResult<Vec<Constraint>> {
    let invalid = |message: String| ModelError::InvalidRule {
        rule: rule.to_string(),
        message,
    };

    fraction
        .check_len(rule, view.timeindex().len())
        .map_err(|e| invalid(e.to_string()))?;
    if !fraction.within(0.0, 1.0) {
        return Err(invalid(format!("fraction must lie in [0, 1], got {}", fraction)));
    }

    let mut constraints = Vec::new();
    for edge in selector.select(rule, view)? {
        let Some(capacity) = edge.flow.nominal_value else {
            warn!(rule, from = %edge.source, to = %edge.target, "flow has no nominal_value, skipping");
            continue;
        };

        for key in view.keys_of(edge) {
            let Some(flow) = view.variable(&key) else { continue };
            let bound = fraction.get(key.timestep) * capacity;
            constraints.push(match direction {
                Direction::AtLeast => constraint!(flow >= bound),
                Direction::AtMost => constraint!(flow <= bound),
            });
        }
    }
    Ok(constraints)
}

/// Lower flow limit, `flow >= min_fraction[t] * nominal_value`
///
/// Models a minimum operating voltage on the selected flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinFlowFraction {
    pub selector: FlowSelector,
    pub fraction: Sequence,
}

impl MinFlowFraction {
    pub fn new(selector: FlowSelector, fraction: impl Into<Sequence>) -> Self {
        Self {
            selector,
            fraction: fraction.into(),
        }
    }
}

impl ConstraintRule for MinFlowFraction {
    fn name(&self) -> &str {
        "voltage_min"
    }

    fn build(&self, view: &ModelView<'_>) -> ModelResult<Vec<Constraint>> {
        fraction_constraints(self.name(), &self.selector, &self.fraction, Direction::AtLeast, view)
    }
}

/// Upper flow limit, `flow <= max_fraction[t] * nominal_value`
///
/// Models a maximum current on the selected flows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaxFlowFraction {
    pub selector: FlowSelector,
    pub fraction: Sequence,
}

impl MaxFlowFraction {
    pub fn new(selector: FlowSelector, fraction: impl Into<Sequence>) -> Self {
        Self {
            selector,
            fraction: fraction.into(),
        }
    }
}

impl ConstraintRule for MaxFlowFraction {
    fn name(&self) -> &str {
        "current_max"
    }

    fn build(&self, view: &ModelView<'_>) -> ModelResult<Vec<Constraint>> {
        fraction_constraints(self.name(), &self.selector, &self.fraction, Direction::AtMost, view)
    }
}
