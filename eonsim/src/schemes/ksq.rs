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

//! Ksq: scans every valid (primary-start x backup-start) combination across up to `k_pri` primary
//! candidates and, per primary, up to `k_bkp` link-disjoint backup candidates, minimising a joint
//! linear cost built from cut count, misalignment, free-spectrum-block count, and distance from
//! the relevant band edge (first-fit bias for the primary, last-fit bias for the backup).
//!
//! Unlike [`super::ff`]/[`super::mfsb`]/[`super::pfmbl`], the primary and backup choices are not
//! made independently: every feasible `(primary window, backup window)` pair is scored as a whole
//! and the global minimum wins, so a primary placement that looks locally worse can still be
//! chosen if it unlocks a much cheaper backup.

use super::{backup_candidates, mask_path_weights, path_distance, Placement};
use crate::bitset::NUM_SLOTS;
use crate::modulation::{self, Modulation};
use crate::network_state::NetworkState;
use crate::pathsearch::YenSearch;
use crate::provisioning::{param_or, ParameterSet, Provisioning, ProvisioningScheme, ProvisioningState, Request};
use crate::scratchpad::Scratchpad;
use crate::topology::{LinkDescriptor, Topology};
use std::fmt;

/// `k_pri`/`k_bkp` default to the global `k`; `c_cut`, `c_algn`, `c_fsb` default to 1.0.
pub struct Ksq {
    k_pri: usize,
    k_bkp: usize,
    c_cut: f64,
    c_algn: f64,
    c_fsb: f64,
}

impl Ksq {
    fn new(params: &ParameterSet) -> Self {
        let k = param_or(params, "k", 4.0);
        Self {
            k_pri: param_or(params, "k_pri", k) as usize,
            k_bkp: param_or(params, "k_bkp", k) as usize,
            c_cut: param_or(params, "c_cut", 1.0),
            c_algn: param_or(params, "c_algn", 1.0),
            c_fsb: param_or(params, "c_fsb", 1.0),
        }
    }

    /// Cost of placing the primary at `[begin, end)` on `path`: the free-spectrum-block term here
    /// is a constant (`path.len() * width`) rather than window-dependent -- it still
    /// differentiates between primary candidates of different lengths, but does not bias the
    /// window search within a single candidate. The trailing `begin * path.len()` term is what
    /// gives the primary its first-fit bias.
    fn cost_primary(&self, state: &NetworkState, topo: &Topology, path: &[LinkDescriptor], begin: usize, end: usize) -> f64 {
        let n = path.len() as f64;
        self.c_fsb * (n * (end - begin) as f64)
            + self.c_cut * state.calc_cuts(path, begin, end) as f64
            + self.c_algn * state.calc_misalignments(topo, path, begin, end)
            + begin as f64 * n
    }

    /// Cost of placing the backup at `[begin, end)` on `path`: the free-spectrum-block term is the
    /// actual count of still-free cross-sectional blocks the window would consume (as in
    /// [`super::mfsb`]); the trailing `(NUM_SLOTS - end) * path.len()` term gives the backup its
    /// last-fit bias.
    fn cost_backup(&self, state: &NetworkState, topo: &Topology, path: &[LinkDescriptor], begin: usize, end: usize) -> f64 {
        let n = path.len() as f64;
        self.c_fsb * state.count_free_blocks_range(path, begin, end) as f64
            + self.c_cut * state.calc_cuts(path, begin, end) as f64
            + self.c_algn * state.calc_misalignments(topo, path, begin, end)
            + (NUM_SLOTS - end) as f64 * n
    }
}

pub fn create(params: &ParameterSet) -> Box<dyn ProvisioningScheme> {
    Box::new(Ksq::new(params))
}

impl fmt::Display for Ksq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ksq(k_pri={}, k_bkp={}, c_cut={}, c_algn={}, c_fsb={})",
            self.k_pri, self.k_bkp, self.c_cut, self.c_algn, self.c_fsb
        )
    }
}

impl ProvisioningScheme for Ksq {
    fn provision(
        &mut self,
        topo: &Topology,
        state: &NetworkState,
        pad: &mut Scratchpad,
        request: &Request,
    ) -> Provisioning {
        pad.reset_weights();
        let mut pri_search = YenSearch::new(request.source, request.destination);
        let pri_paths = pri_search.paths(self.k_pri, topo, pad).to_vec();
        if pri_paths.is_empty() {
            return super::blocked(request.bandwidth, ProvisioningState::BlockPriNoPath);
        }

        let mut best: Option<(f64, Placement, Placement)> = None;
        let mut any_pri_feasible = false;
        let mut any_bkp_path_found = false;

        for pp in &pri_paths {
            let pri_mod = modulation::choose(path_distance(topo, &pp.links));
            if pri_mod == Modulation::None {
                break;
            }
            let pri_width = modulation::slots_needed(request.bandwidth, pri_mod) as usize;
            let pri_avail = state.pri_availability(&pp.links);

            for pri_begin in super::all_fits(&pri_avail, pri_width) {
                let pri_end = pri_begin + pri_width;
                any_pri_feasible = true;
                let cost_p = self.cost_primary(state, topo, &pp.links, pri_begin, pri_end);

                pad.reset_weights();
                mask_path_weights(pad, &pp.links);
                let mut bkp_search = YenSearch::new(request.source, request.destination);
                let bkp_paths = bkp_search.paths(self.k_bkp, topo, pad).to_vec();
                pad.reset_weights();
                if bkp_paths.is_empty() {
                    continue;
                }
                any_bkp_path_found = true;

                for pb in &bkp_paths {
                    let bkp_mod = modulation::choose(path_distance(topo, &pb.links));
                    if bkp_mod == Modulation::None {
                        break;
                    }
                    let bkp_width = modulation::slots_needed(request.bandwidth, bkp_mod) as usize;
                    let bkp_avail = state.bkp_availability_path(&pp.links, &pb.links);

                    for bkp_begin in super::all_fits(&bkp_avail, bkp_width) {
                        let bkp_end = bkp_begin + bkp_width;
                        let cost_b = self.cost_backup(state, topo, &pb.links, bkp_begin, bkp_end);
                        let total = cost_p + cost_b;
                        if best.as_ref().map(|(b, _, _)| total < *b).unwrap_or(true) {
                            best = Some((
                                total,
                                Placement { path: pp.links.clone(), begin: pri_begin, end: pri_end, modulation: pri_mod },
                                Placement { path: pb.links.clone(), begin: bkp_begin, end: bkp_end, modulation: bkp_mod },
                            ));
                        }
                    }
                }
            }
        }

        match best {
            Some((_, pri, bkp)) => super::success(pri, bkp, request.bandwidth),
            None if !any_pri_feasible => super::blocked(request.bandwidth, ProvisioningState::BlockPriNoSpec),
            None if !any_bkp_path_found => super::blocked(request.bandwidth, ProvisioningState::BlockSecNoPath),
            None => super::blocked(request.bandwidth, ProvisioningState::BlockSecNoSpec),
        }
    }

    fn param_help(&self) -> &'static str {
        "k_pri: number of primary candidates to try (default: k)\n\
         k_bkp: number of backup candidates to try per primary (default: k)\n\
         c_cut: weight of the fragmentation-cut metric (default: 1.0)\n\
         c_algn: weight of the misalignment metric (default: 1.0)\n\
         c_fsb: weight of the free-spectrum-block metric (default: 1.0)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::Topology;

    fn triangle() -> Topology {
        Topology::from_edges(
            3,
            vec![(0, 1, 100), (1, 0, 100), (0, 2, 100), (2, 0, 100), (1, 2, 100), (2, 1, 100)],
        )
    }

    #[test]
    fn provisions_on_triangle_and_passes_sanity_check() {
        let topo = triangle();
        let mut state = NetworkState::new(topo.num_links());
        let mut pad = Scratchpad::new(&topo);
        let mut scheme = Ksq::new(&ParameterSet::new());
        let request = Request { source: topo.node(0), destination: topo.node(1), bandwidth: 1 };
        let p = scheme.provision(&topo, &state, &mut pad, &request);
        assert_eq!(p.state, ProvisioningState::Success);
        state.provision(&p);
        state.sanity_check(&[p]);
        assert_eq!(pad.weights, vec![100, 100, 100, 100, 100, 100]);
    }

    #[test]
    fn blocks_backup_on_two_node_graph() {
        let topo = Topology::from_edges(2, vec![(0, 1, 100), (1, 0, 100)]);
        let state = NetworkState::new(topo.num_links());
        let mut pad = Scratchpad::new(&topo);
        let mut scheme = Ksq::new(&ParameterSet::new());
        let request = Request { source: topo.node(0), destination: topo.node(1), bandwidth: 1 };
        let p = scheme.provision(&topo, &state, &mut pad, &request);
        assert_eq!(p.state, ProvisioningState::BlockSecNoPath);
    }
}
