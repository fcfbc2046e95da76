// Eonsim: Monte-Carlo Shared-Path-Protection Simulator for Elastic Optical Networks
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! Immutable, process-wide directed weighted graph.
//!
//! Built once at startup from a textual adjacency matrix and never mutated again, so it can be
//! shared by reference across every worker thread without synchronisation. Internally backed by
//! [`petgraph::stable_graph::StableGraph`]; "stable" indices are not strictly required here since
//! the topology never loses nodes or edges after loading, but it keeps edge/node index types
//! consistent with the rest of the crate.

use crate::error::{Error, Result};
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableGraph};
use petgraph::Directed;
use std::io::BufRead;

/// Index type backing both node and edge indices.
pub type IndexType = u32;
/// A node identifier.
pub type NodeId = NodeIndex<IndexType>;
/// A link (directed edge) identifier. Doubles as the link index `l` used throughout the
/// spectrum/sharing bookkeeping.
pub type LinkId = EdgeIndex<IndexType>;

/// Distance-unit quantization applied to raw matrix entries (`round(value / DISTANCE_UNIT)`).
pub const DISTANCE_UNIT: f64 = 1.0;
/// Amplifier spacing, in distance units; every link gets `ceil(length / AMP_DIST) + 1` amplifiers.
pub const AMP_DIST: u32 = 80;

type Graph = StableGraph<(), u32, Directed, IndexType>;

fn amplifier_count(length: u32) -> u32 {
    (length + AMP_DIST - 1) / AMP_DIST + 1
}

/// A directed edge, identified by its source node and its own link index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkDescriptor {
    /// Source node of the link.
    pub source: NodeId,
    /// Index of the link itself.
    pub link: LinkId,
}

/// The read-only topology graph.
#[derive(Debug, Clone)]
pub struct Topology {
    graph: Graph,
    /// Per-link amplifier count, derived once at load time (see [`Topology::num_amplifiers`]).
    amplifiers: Vec<u32>,
}

impl Topology {
    /// Builds a topology directly from a list of `(source, target, length)` triples, bypassing
    /// the text loader. Useful for tests and for programmatic construction.
    pub fn from_edges(num_nodes: usize, edges: impl IntoIterator<Item = (usize, usize, u32)>) -> Self {
        let mut graph: Graph = StableGraph::with_capacity(num_nodes, 0);
        let nodes: Vec<NodeId> = (0..num_nodes).map(|_| graph.add_node(())).collect();
        let mut amplifiers = Vec::new();
        for (u, v, len) in edges {
            graph.add_edge(nodes[u], nodes[v], len);
            amplifiers.push(amplifier_count(len));
        }
        Self { graph, amplifiers }
    }

    /// Parses the matrix-format topology file: an optional node-count/link-count/label header
    /// followed by an `N x N`
    /// row-major matrix of non-negative lengths; `0` means "no link", any positive value becomes
    /// a directed link of length `round(value / DISTANCE_UNIT)`.
    pub fn load_matrix(reader: impl BufRead) -> Result<Self> {
        let mut tokens = reader.lines().collect::<std::io::Result<Vec<_>>>()?.join(" ");
        // Fold runs of whitespace so tokenizing is trivial.
        tokens = tokens.split_whitespace().collect::<Vec<_>>().join(" ");
        let mut iter = tokens.split_whitespace().enumerate();

        let (idx, first) = iter.next().ok_or_else(|| Error::TopologyParse {
            token_index: 0,
            reason: "empty input".into(),
        })?;
        let num_nodes: usize = first.parse().map_err(|_| Error::TopologyParse {
            token_index: idx,
            reason: format!("expected node count, found `{}`", first),
        })?;

        // Peek: if the next token parses as an integer distinct from the first matrix value, and
        // there turn out to be N extra label lines, this is the long-form header. We approximate
        // the "is the next non-whitespace character a digit" rule by
        // trying to parse the next token as an integer link count; if there are not enough
        // remaining tokens to treat it as a link count, treat it as the first matrix entry
        // instead.
        let remaining: Vec<(usize, &str)> = iter.collect();
        let expected_matrix_tokens = num_nodes * num_nodes;

        let matrix_tokens: &[(usize, &str)] = if remaining.len() > expected_matrix_tokens
            && remaining[0].1.parse::<usize>().is_ok()
        {
            // long form: link count + N label tokens precede the matrix
            &remaining[(1 + num_nodes)..]
        } else {
            &remaining[..]
        };

        if matrix_tokens.len() < expected_matrix_tokens {
            return Err(Error::TopologyParse {
                token_index: idx + 1,
                reason: format!(
                    "expected {} matrix entries, found {}",
                    expected_matrix_tokens,
                    matrix_tokens.len()
                ),
            });
        }

        let mut graph: Graph = StableGraph::with_capacity(num_nodes, 0);
        let nodes: Vec<NodeId> = (0..num_nodes).map(|_| graph.add_node(())).collect();
        let mut amplifiers = Vec::new();

        for u in 0..num_nodes {
            for v in 0..num_nodes {
                let (token_index, token) = matrix_tokens[u * num_nodes + v];
                let value: f64 = token.parse().map_err(|_| Error::TopologyParse {
                    token_index,
                    reason: format!("expected a non-negative number, found `{}`", token),
                })?;
                if value < 0.0 {
                    return Err(Error::TopologyParse {
                        token_index,
                        reason: format!("link length must be non-negative, found {}", value),
                    });
                }
                if value > 0.0 {
                    let length = (value / DISTANCE_UNIT).round() as u32;
                    graph.add_edge(nodes[u], nodes[v], length);
                    amplifiers.push(amplifier_count(length));
                }
            }
        }

        Ok(Self { graph, amplifiers })
    }

    /// Number of nodes `N`.
    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of links `L`.
    pub fn num_links(&self) -> usize {
        self.graph.edge_count()
    }

    /// Node identifier for the `i`-th node, `0 <= i < num_nodes()`.
    pub fn node(&self, i: usize) -> NodeId {
        NodeIndex::new(i)
    }

    /// Length of link `l`, in distance units.
    pub fn link_length(&self, l: LinkId) -> u32 {
        self.graph[l]
    }

    /// Number of optical amplifiers on link `l`, derived once at load time.
    pub fn num_amplifiers(&self, l: LinkId) -> u32 {
        self.amplifiers[l.index()]
    }

    /// The link index, if any, connecting `u` directly to `v`.
    pub fn edge(&self, u: NodeId, v: NodeId) -> Option<LinkId> {
        self.graph.find_edge(u, v)
    }

    /// Out-edges of `u`, as link descriptors.
    pub fn out_edges(&self, u: NodeId) -> impl Iterator<Item = LinkDescriptor> + '_ {
        self.graph.edges(u).map(move |e| LinkDescriptor { source: u, link: e.id() })
    }

    /// Source and target endpoints of link `l`.
    pub fn endpoints(&self, l: LinkId) -> (NodeId, NodeId) {
        self.graph.edge_endpoints(l).expect("link id from a valid topology")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_bare_matrix() {
        let text = "2\n0 100\n100 0\n";
        let topo = Topology::load_matrix(text.as_bytes()).unwrap();
        assert_eq!(topo.num_nodes(), 2);
        assert_eq!(topo.num_links(), 2);
    }

    #[test]
    fn rejects_malformed_token() {
        let text = "2\n0 abc\n100 0\n";
        let err = Topology::load_matrix(text.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::TopologyParse { .. }));
    }

    #[test]
    fn triangle_from_edges() {
        let topo = Topology::from_edges(3, vec![(0, 1, 100), (1, 0, 100), (0, 2, 100), (2, 0, 100), (1, 2, 100), (2, 1, 100)]);
        assert_eq!(topo.num_nodes(), 3);
        assert_eq!(topo.num_links(), 6);
        let l = topo.edge(topo.node(0), topo.node(1)).unwrap();
        assert_eq!(topo.link_length(l), 100);
    }
}
