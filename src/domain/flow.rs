use serde::{Deserialize, Serialize};

use super::{Sequence, TimeIndex};
use crate::error::{ModelError, ModelResult};

/// Parameters of a directed flow between a node and a bus
///
/// Bounds per timestep `t`:
/// - `fix` set: `flow = fix[t] * nominal_value`
/// - otherwise: `min[t] * nominal_value <= flow <= max[t] * nominal_value`
///   with `min` defaulting to 0 and `max` to 1
/// - no nominal value: `0 <= flow`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Flow {
    pub nominal_value: Option<f64>,
    pub min: Option<Sequence>,
    pub max: Option<Sequence>,
    pub fix: Option<Sequence>,
    pub variable_costs: Option<Sequence>,
}

/// Lower and upper bound of a flow at one timestep
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowBounds {
    pub lower: f64,
    pub upper: Option<f64>,
}

impl Flow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nominal_value(mut self, value: f64) -> Self {
        self.nominal_value = Some(value);
        self
    }

    pub fn min(mut self, seq: impl Into<Sequence>) -> Self {
        self.min = Some(seq.into());
        self
    }

    pub fn max(mut self, seq: impl Into<Sequence>) -> Self {
        self.max = Some(seq.into());
        self
    }

    pub fn fix(mut self, seq: impl Into<Sequence>) -> Self {
        self.fix = Some(seq.into());
        self
    }

    pub fn variable_costs(mut self, seq: impl Into<Sequence>) -> Self {
        self.variable_costs = Some(seq.into());
        self
    }

    /// Variable cost per unit of flow at timestep `t`
    pub fn cost_at(&self, t: usize) -> f64 {
        self.variable_costs.as_ref().map_or(0.0, |c| c.get(t))
    }

    pub fn bounds_at(&self, t: usize) -> FlowBounds {
        let Some(nominal) = self.nominal_value else {
            return FlowBounds { lower: 0.0, upper: None };
        };

        if let Some(fix) = &self.fix {
            let value = fix.get(t) * nominal;
            return FlowBounds { lower: value, upper: Some(value) };
        }

        let lower = self.min.as_ref().map_or(0.0, |m| m.get(t)) * nominal;
        let upper = self.max.as_ref().map_or(1.0, |m| m.get(t)) * nominal;
        FlowBounds { lower, upper: Some(upper) }
    }

    /// Check the flow against the time index it will be modelled on
    pub fn validate(&self, from: &str, to: &str, timeindex: &TimeIndex) -> ModelResult<()> {
        if let Some(nominal) = self.nominal_value {
            if !nominal.is_finite() || nominal < 0.0 {
                return Err(ModelError::invalid_flow(
                    from,
                    to,
                    format!("nominal_value must be finite and non-negative, got {}", nominal),
                ));
            }
        }

        let named = [
            ("min", &self.min),
            ("max", &self.max),
            ("fix", &self.fix),
            ("variable_costs", &self.variable_costs),
        ];
        for (name, seq) in named {
            let Some(seq) = seq else { continue };
            seq.check_len(&format!("{} -> {} {}", from, to, name), timeindex.len())?;
            if !seq.all_finite() {
                return Err(ModelError::invalid_flow(from, to, format!("{} contains non-finite values", name)));
            }
        }

        if self.nominal_value.is_none() && (self.fix.is_some() || self.min.is_some() || self.max.is_some()) {
            return Err(ModelError::invalid_flow(
                from,
                to,
                "fix, min and max are fractions of nominal_value and require it",
            ));
        }

        if self.fix.is_some() && (self.min.is_some() || self.max.is_some()) {
            return Err(ModelError::invalid_flow(from, to, "fix cannot be combined with min or max"));
        }

        for (name, seq) in [("min", &self.min), ("max", &self.max), ("fix", &self.fix)] {
            if seq.as_ref().is_some_and(|s| !s.within(0.0, f64::INFINITY)) {
                return Err(ModelError::invalid_flow(from, to, format!("{} must be non-negative", name)));
            }
        }

        for t in 0..timeindex.len() {
            let bounds = self.bounds_at(t);
            if bounds.upper.is_some_and(|upper| upper < bounds.lower) {
                return Err(ModelError::invalid_flow(
                    from,
                    to,
                    format!("min exceeds max at timestep {}", t),
                ));
            }
        }

        Ok(())
    }
}
