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

//! Dijkstra shortest path and Yen's k-shortest-loopless-paths search.
//!
//! Both operate over whichever weight array the caller currently has installed in the
//! [`Scratchpad`] (`weights`, or `tmp_weights` while Yen is masking a spur) -- heuristics that
//! need to prune specific links (e.g. the primary path before searching for a backup) do so by
//! mutating `scratchpad.weights` to [`INFINITE_WEIGHT`] before calling, and are responsible for
//! calling [`Scratchpad::reset_weights`] afterwards per the provisioning-scheme contract.

use crate::scratchpad::{Scratchpad, INFINITE_WEIGHT};
use crate::topology::{LinkDescriptor, LinkId, NodeId, Topology};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

/// Runs Dijkstra from `s` to `d` over `scratchpad.weights`, the "permanent" weight array.
///
/// Returns the ordered list of link descriptors forming the shortest path, or an empty vector
/// if `d` is unreachable from `s`. Ties in the priority queue are broken by node index, so the
/// result is deterministic regardless of traversal order.
pub fn dijkstra(topo: &Topology, pad: &mut Scratchpad, s: NodeId, d: NodeId) -> Vec<LinkDescriptor> {
    let Scratchpad { weights, dist, pred, color, .. } = pad;
    dijkstra_with(topo, weights, dist, pred, color, s, d)
}

/// Like [`dijkstra`], but runs over `scratchpad.tmp_weights` instead -- used internally by
/// [`YenSearch`] spur computation, and available to callers that want to run a one-off masked
/// search without touching the permanent weight array.
pub fn dijkstra_masked(topo: &Topology, pad: &mut Scratchpad, s: NodeId, d: NodeId) -> Vec<LinkDescriptor> {
    let Scratchpad { tmp_weights, dist, pred, color, .. } = pad;
    dijkstra_with(topo, tmp_weights, dist, pred, color, s, d)
}

fn dijkstra_with(
    topo: &Topology,
    weights: &[u32],
    dist: &mut [u32],
    pred: &mut [Option<LinkId>],
    color: &mut [bool],
    s: NodeId,
    d: NodeId,
) -> Vec<LinkDescriptor> {
    for v in dist.iter_mut() {
        *v = INFINITE_WEIGHT;
    }
    for v in pred.iter_mut() {
        *v = None;
    }
    for v in color.iter_mut() {
        *v = false;
    }
    dist[s.index()] = 0;

    let mut heap = BinaryHeap::new();
    heap.push(Reverse((0u32, s.index() as u32, s)));

    while let Some(Reverse((du, _, u))) = heap.pop() {
        if color[u.index()] {
            continue;
        }
        color[u.index()] = true;
        if u == d {
            break;
        }
        for ld in topo.out_edges(u) {
            let w = weights[ld.link.index()];
            if w == INFINITE_WEIGHT {
                continue;
            }
            let (_, v) = topo.endpoints(ld.link);
            if color[v.index()] {
                continue;
            }
            let nd = du.saturating_add(w);
            if nd < dist[v.index()] {
                dist[v.index()] = nd;
                pred[v.index()] = Some(ld.link);
                heap.push(Reverse((nd, v.index() as u32, v)));
            }
        }
    }

    reconstruct_path(topo, pred, s, d)
}

fn reconstruct_path(topo: &Topology, pred: &[Option<LinkId>], s: NodeId, d: NodeId) -> Vec<LinkDescriptor> {
    if s == d || pred[d.index()].is_none() {
        return Vec::new();
    }
    let mut links = Vec::new();
    let mut cur = d;
    while cur != s {
        let link = pred[cur.index()].expect("dijkstra populates the full predecessor chain to a reachable node");
        let (src, _) = topo.endpoints(link);
        links.push(LinkDescriptor { source: src, link });
        cur = src;
    }
    links.reverse();
    links
}

fn path_length(weights: &[u32], links: &[LinkDescriptor]) -> u64 {
    links.iter().map(|ld| weights[ld.link.index()] as u64).sum()
}

/// One path found by [`YenSearch`], together with its total length under the weight array that
/// was active when it was discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YenPath {
    /// The ordered links of the path.
    pub links: Vec<LinkDescriptor>,
    /// Total length (sum of link weights).
    pub length: u64,
}

/// Stateful Yen k-shortest-paths search, reusable across successive widenings of `k`.
///
/// Keeps the accepted path list `A` and the candidate buffer `B` across calls to
/// [`YenSearch::paths`], so widening `k` for the same `(s, d)` does not redo earlier work.
pub struct YenSearch {
    s: NodeId,
    d: NodeId,
    accepted: Vec<YenPath>,
    /// Keyed by `(length, insertion_sequence)` so a `BTreeMap` gives a total, stable order: on
    /// ties the earliest-inserted candidate is popped first, matching Yen's
    /// tie-break policy without needing a true multi-map.
    candidates: BTreeMap<(u64, u64), YenPath>,
    next_seq: u64,
}

impl YenSearch {
    /// Creates a search for `s -> d` with empty `A` and `B`.
    pub fn new(s: NodeId, d: NodeId) -> Self {
        Self { s, d, accepted: Vec::new(), candidates: BTreeMap::new(), next_seq: 0 }
    }

    /// Discards `A` and `B`, keeping the current endpoints.
    pub fn reset(&mut self) {
        self.accepted.clear();
        self.candidates.clear();
        self.next_seq = 0;
    }

    /// Discards `A` and `B` and rebinds the search to new endpoints.
    pub fn reset_to(&mut self, s: NodeId, d: NodeId) {
        self.s = s;
        self.d = d;
        self.reset();
    }

    /// Computes (if not already cached) up to `k` loopless paths from `s` to `d`, in
    /// non-decreasing length, and returns them as a slice -- shorter than `k` entries if fewer
    /// than `k` loopless paths exist.
    pub fn paths(&mut self, k: usize, topo: &Topology, pad: &mut Scratchpad) -> &[YenPath] {
        if self.accepted.is_empty() {
            let links = dijkstra(topo, pad, self.s, self.d);
            if self.s != self.d && links.is_empty() {
                return &self.accepted;
            }
            let length = path_length(&pad.weights, &links);
            self.accepted.push(YenPath { links, length });
        }

        while self.accepted.len() < k {
            let prev = self.accepted.last().unwrap().clone();

            for i in 0..prev.links.len() {
                let spur_node = prev.links[i].source;
                let root = &prev.links[..i];

                pad.tmp_weights.copy_from_slice(&pad.weights);

                for p in &self.accepted {
                    if p.links.len() > i && &p.links[..i] == root {
                        pad.tmp_weights[p.links[i].link.index()] = INFINITE_WEIGHT;
                    }
                }
                for ld in root {
                    for out in topo.out_edges(ld.source) {
                        pad.tmp_weights[out.link.index()] = INFINITE_WEIGHT;
                    }
                }

                let spur_links = dijkstra_masked(topo, pad, spur_node, self.d);
                if spur_node == self.d || !spur_links.is_empty() {
                    let mut candidate_links = root.to_vec();
                    candidate_links.extend(spur_links);
                    let length = path_length(&pad.weights, &candidate_links);

                    let duplicate = self
                        .candidates
                        .range((length, 0)..(length + 1, 0))
                        .any(|(_, existing)| existing.links == candidate_links);
                    if !duplicate {
                        let seq = self.next_seq;
                        self.next_seq += 1;
                        self.candidates.insert((length, seq), YenPath { links: candidate_links, length });
                    }
                }
            }

            let next_key = match self.candidates.keys().next().copied() {
                Some(k) => k,
                None => break,
            };
            let next = self.candidates.remove(&next_key).unwrap();
            self.accepted.push(next);
        }

        let n = k.min(self.accepted.len());
        &self.accepted[..n]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::Topology;

    fn diamond() -> Topology {
        // A=0, B=1, C=2, D=3; A->B->D and A->C->D, equal length, B < C.
        Topology::from_edges(4, vec![(0, 1, 10), (1, 3, 10), (0, 2, 10), (2, 3, 10)])
    }

    #[test]
    fn dijkstra_finds_shortest_path() {
        let topo = diamond();
        let mut pad = Scratchpad::new(&topo);
        let path = dijkstra(&topo, &mut pad, topo.node(0), topo.node(3));
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn dijkstra_unreachable_is_empty() {
        let topo = Topology::from_edges(2, vec![]);
        let mut pad = Scratchpad::new(&topo);
        let path = dijkstra(&topo, &mut pad, topo.node(0), topo.node(1));
        assert!(path.is_empty());
    }

    #[test]
    fn yen_tie_break_prefers_lower_node_index() {
        let topo = diamond();
        let mut pad = Scratchpad::new(&topo);
        let mut search = YenSearch::new(topo.node(0), topo.node(3));
        let paths = search.paths(2, &topo, &mut pad).to_vec();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].length, paths[1].length);
        // first path must go through B (node 1) before C (node 2)
        let (_, via) = topo.endpoints(paths[0].links[0].link);
        assert_eq!(via, topo.node(1));
        let (_, via2) = topo.endpoints(paths[1].links[0].link);
        assert_eq!(via2, topo.node(2));
    }

    #[test]
    fn yen_paths_are_simple_and_non_decreasing() {
        let topo = Topology::from_edges(
            5,
            vec![(0, 1, 1), (1, 2, 1), (2, 4, 1), (0, 3, 1), (3, 4, 5), (1, 3, 1), (3, 2, 1)],
        );
        let mut pad = Scratchpad::new(&topo);
        let mut search = YenSearch::new(topo.node(0), topo.node(4));
        let paths = search.paths(4, &topo, &mut pad).to_vec();
        let mut last_len = 0u64;
        for p in &paths {
            assert!(p.length >= last_len);
            last_len = p.length;
            let mut nodes = vec![p.links.first().map(|l| l.source)];
            for l in &p.links {
                nodes.push(Some(topo.endpoints(l.link).1));
            }
            let nodes: Vec<_> = nodes.into_iter().flatten().collect();
            let mut sorted = nodes.clone();
            sorted.sort_by_key(|n| n.index());
            sorted.dedup();
            assert_eq!(sorted.len(), nodes.len(), "path must be simple");
        }
        for i in 0..paths.len() {
            for j in (i + 1)..paths.len() {
                assert_ne!(paths[i].links, paths[j].links, "paths must be distinct");
            }
        }
    }
}
