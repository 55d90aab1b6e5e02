use serde::{Deserialize, Serialize};

use super::Flow;

/// Network node through which flows balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bus {
    pub label: String,
    /// When true, inflows equal outflows at every timestep
    pub balanced: bool,
}

impl Bus {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            balanced: true,
        }
    }

    pub fn unbalanced(mut self) -> Self {
        self.balanced = false;
        self
    }
}

/// Node feeding flows into one or more buses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub label: String,
    /// (bus label, flow) pairs
    pub outputs: Vec<(String, Flow)>,
}

impl Source {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            outputs: Vec::new(),
        }
    }

    pub fn output(mut self, bus: &Bus, flow: Flow) -> Self {
        self.outputs.push((bus.label.clone(), flow));
        self
    }
}

/// Node drawing flows out of one or more buses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sink {
    pub label: String,
    /// (bus label, flow) pairs
    pub inputs: Vec<(String, Flow)>,
}

impl Sink {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            inputs: Vec::new(),
        }
    }

    pub fn input(mut self, bus: &Bus, flow: Flow) -> Self {
        self.inputs.push((bus.label.clone(), flow));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Bus(Bus),
    Source(Source),
    Sink(Sink),
}

impl Node {
    pub fn label(&self) -> &str {
        match self {
            Node::Bus(b) => &b.label,
            Node::Source(s) => &s.label,
            Node::Sink(s) => &s.label,
        }
    }

    pub fn as_bus(&self) -> Option<&Bus> {
        match self {
            Node::Bus(b) => Some(b),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Node::Bus(_) => "bus",
            Node::Source(_) => "source",
            Node::Sink(_) => "sink",
        }
    }
}

impl From<Bus> for Node {
    fn from(b: Bus) -> Self {
        Node::Bus(b)
    }
}

impl From<Source> for Node {
    fn from(s: Source) -> Self {
        Node::Source(s)
    }
}

impl From<Sink> for Node {
    fn from(s: Sink) -> Self {
        Node::Sink(s)
    }
}
