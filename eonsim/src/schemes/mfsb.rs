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

//! MFSB (Chen-style): primary as in [`super::ff`]; among backup candidates, minimise the
//! "free spectrum block" count -- the sum, over the chosen slot window, of how many links in the
//! path have that slot free. Destroying fewer already-free cross-sectional blocks leaves more
//! spectrum assignable to future requests.

use super::{backup_candidates, select_backup_min_cost, select_primary_first_fit, success};
use crate::network_state::NetworkState;
use crate::provisioning::{param_or, ParameterSet, Provisioning, ProvisioningScheme, Request};
use crate::scratchpad::Scratchpad;
use crate::topology::Topology;
use std::fmt;

/// `k_pri`/`k_bkp` default to the global `k` sweep parameter (itself defaulting to 4).
pub struct Mfsb {
    k_pri: usize,
    k_bkp: usize,
}

impl Mfsb {
    fn new(params: &ParameterSet) -> Self {
        let k = param_or(params, "k", 4.0);
        Self {
            k_pri: param_or(params, "k_pri", k) as usize,
            k_bkp: param_or(params, "k_bkp", k) as usize,
        }
    }
}

pub fn create(params: &ParameterSet) -> Box<dyn ProvisioningScheme> {
    Box::new(Mfsb::new(params))
}

impl fmt::Display for Mfsb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mfsb(k_pri={}, k_bkp={})", self.k_pri, self.k_bkp)
    }
}

impl ProvisioningScheme for Mfsb {
    fn provision(
        &mut self,
        topo: &Topology,
        state: &NetworkState,
        pad: &mut Scratchpad,
        request: &Request,
    ) -> Provisioning {
        let pri = match select_primary_first_fit(
            topo,
            state,
            pad,
            request.source,
            request.destination,
            request.bandwidth,
            self.k_pri,
        ) {
            Ok(p) => p,
            Err(reason) => return super::blocked(request.bandwidth, reason),
        };

        let candidates = backup_candidates(topo, pad, &pri.path, request.source, request.destination, self.k_bkp);
        let bkp = match select_backup_min_cost(topo, state, &pri.path, &candidates, request.bandwidth, |path, begin, end| {
            state.count_free_blocks_range(path, begin, end) as f64
        }) {
            Ok(b) => b,
            Err(reason) => return super::blocked(request.bandwidth, reason),
        };

        success(pri, bkp, request.bandwidth)
    }

    fn param_help(&self) -> &'static str {
        "k_pri: number of primary candidates to try (default: k)\n\
         k_bkp: number of backup candidates to try (default: k)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provisioning::ProvisioningState;
    use crate::topology::Topology;

    #[test]
    fn provisions_on_triangle_and_passes_sanity_check() {
        let topo = Topology::from_edges(
            3,
            vec![(0, 1, 100), (1, 0, 100), (0, 2, 100), (2, 0, 100), (1, 2, 100), (2, 1, 100)],
        );
        let mut state = NetworkState::new(topo.num_links());
        let mut pad = Scratchpad::new(&topo);
        let mut scheme = Mfsb::new(&ParameterSet::new());
        let request = Request { source: topo.node(0), destination: topo.node(1), bandwidth: 1 };
        let p = scheme.provision(&topo, &state, &mut pad, &request);
        assert_eq!(p.state, ProvisioningState::Success);
        state.provision(&p);
        state.sanity_check(&[p]);
    }

    #[test]
    fn blocks_backup_on_two_node_graph() {
        let topo = Topology::from_edges(2, vec![(0, 1, 100), (1, 0, 100)]);
        let state = NetworkState::new(topo.num_links());
        let mut pad = Scratchpad::new(&topo);
        let mut scheme = Mfsb::new(&ParameterSet::new());
        let request = Request { source: topo.node(0), destination: topo.node(1), bandwidth: 1 };
        let p = scheme.provision(&topo, &state, &mut pad, &request);
        assert_eq!(p.state, ProvisioningState::BlockSecNoPath);
    }
}
