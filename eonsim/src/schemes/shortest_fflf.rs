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

//! Single-shortest-path primary/backup with first-fit/last-fit slot assignment.

use super::{blocked, success};
use crate::network_state::NetworkState;
use crate::pathsearch::dijkstra;
use crate::provisioning::{ParameterSet, Provisioning, ProvisioningScheme, ProvisioningState, Request};
use crate::scratchpad::Scratchpad;
use crate::topology::Topology;
use crate::modulation;
use std::fmt;

/// Primary via plain Dijkstra + first-fit; backup via Dijkstra over the primary-masked graph +
/// last-fit. Takes no tunable parameters.
pub struct ShortestFfLf;

pub fn create(_params: &ParameterSet) -> Box<dyn ProvisioningScheme> {
    Box::new(ShortestFfLf)
}

impl fmt::Display for ShortestFfLf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shortestfflf")
    }
}

impl ProvisioningScheme for ShortestFfLf {
    fn provision(
        &mut self,
        topo: &Topology,
        state: &NetworkState,
        pad: &mut Scratchpad,
        request: &Request,
    ) -> Provisioning {
        pad.reset_weights();
        let pri_path = dijkstra(topo, pad, request.source, request.destination);
        if pri_path.is_empty() {
            return blocked(request.bandwidth, ProvisioningState::BlockPriNoPath);
        }
        let distance: u32 = pri_path.iter().map(|ld| topo.link_length(ld.link)).sum();
        let pri_mod = modulation::choose(distance);
        if pri_mod == crate::modulation::Modulation::None {
            return blocked(request.bandwidth, ProvisioningState::BlockPriNoSpec);
        }
        let pri_width = modulation::slots_needed(request.bandwidth, pri_mod) as usize;
        let pri_avail = state.pri_availability(&pri_path);
        let pri_begin = match pri_avail.first_fit(pri_width) {
            Some(b) => b,
            None => return blocked(request.bandwidth, ProvisioningState::BlockPriNoSpec),
        };

        for ld in &pri_path {
            pad.weights[ld.link.index()] = crate::scratchpad::INFINITE_WEIGHT;
        }
        let bkp_path = dijkstra(topo, pad, request.source, request.destination);
        pad.reset_weights();
        if bkp_path.is_empty() {
            return blocked(request.bandwidth, ProvisioningState::BlockSecNoPath);
        }
        let bkp_distance: u32 = bkp_path.iter().map(|ld| topo.link_length(ld.link)).sum();
        let bkp_mod = modulation::choose(bkp_distance);
        if bkp_mod == crate::modulation::Modulation::None {
            return blocked(request.bandwidth, ProvisioningState::BlockSecNoSpec);
        }
        let bkp_width = modulation::slots_needed(request.bandwidth, bkp_mod) as usize;
        let bkp_avail = state.bkp_availability_path(&pri_path, &bkp_path);
        let bkp_begin = match bkp_avail.last_fit(bkp_width) {
            Some(b) => b,
            None => return blocked(request.bandwidth, ProvisioningState::BlockSecNoSpec),
        };

        success(
            super::Placement { path: pri_path, begin: pri_begin, end: pri_begin + pri_width, modulation: pri_mod },
            super::Placement { path: bkp_path, begin: bkp_begin, end: bkp_begin + bkp_width, modulation: bkp_mod },
            request.bandwidth,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::Topology;

    #[test]
    fn blocks_when_no_disjoint_backup_exists() {
        let topo = Topology::from_edges(2, vec![(0, 1, 100), (1, 0, 100)]);
        let state = NetworkState::new(topo.num_links());
        let mut pad = Scratchpad::new(&topo);
        let mut scheme = ShortestFfLf;
        let request = Request { source: topo.node(0), destination: topo.node(1), bandwidth: 1 };
        let p = scheme.provision(&topo, &state, &mut pad, &request);
        assert_eq!(p.state, ProvisioningState::BlockSecNoPath);
    }
}
