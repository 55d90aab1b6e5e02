use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

use super::{Bus, Flow, Node, TimeIndex};
use crate::error::{ModelError, ModelResult};

/// Directed edge between two nodes, borrowed from the energy system
#[derive(Debug, Clone, Copy)]
pub struct FlowEdge<'a> {
    pub source: &'a str,
    pub target: &'a str,
    /// The end of the edge that must be a bus
    pub bus: &'a str,
    pub flow: &'a Flow,
}

/// Container owning the time index and every node added to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergySystem {
    pub timeindex: TimeIndex,
    nodes: Vec<Node>,
}

impl EnergySystem {
    pub fn new(timeindex: TimeIndex) -> Self {
        Self {
            timeindex,
            nodes: Vec::new(),
        }
    }

    /// Add a node; labels are unique across all node kinds
    pub fn add(&mut self, node: impl Into<Node>) -> ModelResult<()> {
        let node = node.into();
        if self.node(node.label()).is_some() {
            return Err(ModelError::DuplicateLabel(node.label().to_string()));
        }
        debug!(label = node.label(), kind = node.kind(), "adding node");
        self.nodes.push(node);
        Ok(())
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, label: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.label() == label)
    }

    pub fn buses(&self) -> impl Iterator<Item = &Bus> {
        self.nodes.iter().filter_map(Node::as_bus)
    }

    /// Every directed flow, in node insertion order
    pub fn flows(&self) -> Vec<FlowEdge<'_>> {
        let mut edges = Vec::new();
        for node in &self.nodes {
            match node {
                Node::Source(source) => {
                    for (bus, flow) in &source.outputs {
                        edges.push(FlowEdge {
                            source: &source.label,
                            target: bus,
                            bus,
                            flow,
                        });
                    }
                }
                Node::Sink(sink) => {
                    for (bus, flow) in &sink.inputs {
                        edges.push(FlowEdge {
                            source: bus,
                            target: &sink.label,
                            bus,
                            flow,
                        });
                    }
                }
                Node::Bus(_) => {}
            }
        }
        edges
    }

    /// Check that every flow touches a known bus, appears once and is well
    /// formed
    pub fn validate(&self) -> ModelResult<()> {
        let mut seen = HashSet::new();
        for edge in self.flows() {
            if !seen.insert((edge.source, edge.target)) {
                return Err(ModelError::DuplicateFlow {
                    from: edge.source.to_string(),
                    to: edge.target.to_string(),
                });
            }
            match self.node(edge.bus) {
                None => return Err(ModelError::UnknownNode(edge.bus.to_string())),
                Some(Node::Bus(_)) => {}
                Some(_) => {
                    return Err(ModelError::NotABus {
                        from: edge.source.to_string(),
                        to: edge.target.to_string(),
                    })
                }
            }
            edge.flow.validate(edge.source, edge.target, &self.timeindex)?;
        }
        Ok(())
    }
}
