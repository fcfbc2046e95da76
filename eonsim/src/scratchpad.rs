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

//! Per-worker path-search scratchpad.
//!
//! Holds every array [`crate::pathsearch`] needs so that Dijkstra/Yen never allocate in the hot
//! loop. Exclusive use during a search is enforced by ownership: callers pass `&mut Scratchpad`
//! into the search functions rather than sharing it, so two searches can never run over the same
//! arrays concurrently.

use crate::topology::Topology;

/// Sentinel "infinite" weight used to mask edges during Yen's spur search.
pub const INFINITE_WEIGHT: u32 = u32::MAX;

/// Reusable arrays for Dijkstra and Yen, sized once per topology.
pub struct Scratchpad {
    /// Edge weights used by the current search; mutated (masked) during Yen spurs.
    pub weights: Vec<u32>,
    /// Scratch copy of `weights` used while masking and restoring during a Yen spur.
    pub tmp_weights: Vec<u32>,
    /// Native (unmasked) edge lengths, used to restore `weights`/`tmp_weights`.
    native_weights: Vec<u32>,
    /// Tentative distances, indexed by node.
    pub dist: Vec<u32>,
    /// Predecessor link into each node on the current shortest-path tree.
    pub pred: Vec<Option<crate::topology::LinkId>>,
    /// Visitation colors (settled/unsettled) for Dijkstra.
    pub color: Vec<bool>,
}

impl Scratchpad {
    /// Allocates a scratchpad sized for `topo` and initializes weights to native link lengths.
    pub fn new(topo: &Topology) -> Self {
        let native_weights: Vec<u32> =
            (0..topo.num_links()).map(|i| topo.link_length(petgraph::stable_graph::EdgeIndex::new(i))).collect();
        let n = topo.num_nodes();
        Self {
            weights: native_weights.clone(),
            tmp_weights: native_weights.clone(),
            native_weights,
            dist: vec![0; n],
            pred: vec![None; n],
            color: vec![false; n],
        }
    }

    /// Restores `weights` and `tmp_weights` to the topology's native link lengths.
    pub fn reset_weights(&mut self) {
        self.weights.copy_from_slice(&self.native_weights);
        self.tmp_weights.copy_from_slice(&self.native_weights);
    }
}
