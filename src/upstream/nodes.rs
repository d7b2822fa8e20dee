//! Processing node selection.

use rand::seq::SliceRandom;

/// Fixed list of processing nodes. No health tracking: a dead node fails
/// the request that picked it.
#[derive(Debug, Clone)]
pub struct NodePool {
    nodes: Vec<String>,
}

impl NodePool {
    pub fn new(nodes: Vec<String>) -> Self {
        Self { nodes }
    }

    /// Pick a node uniformly at random.
    pub fn pick(&self) -> Option<&str> {
        self.nodes.choose(&mut rand::thread_rng()).map(String::as_str)
    }
}
