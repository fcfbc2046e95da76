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

//! FF (Shao-style): first Yen primary candidate that first-fits, then first Yen backup candidate
//! (link-disjoint from the chosen primary) that first-fits.

use super::{backup_candidates, select_backup_first_fit, select_primary_first_fit, success};
use crate::network_state::NetworkState;
use crate::provisioning::{param_or, ParameterSet, Provisioning, ProvisioningScheme, Request};
use crate::scratchpad::Scratchpad;
use crate::topology::Topology;
use std::fmt;

/// `k_pri`/`k_bkp` default to the global `k` sweep parameter (itself defaulting to 4).
pub struct Ff {
    k_pri: usize,
    k_bkp: usize,
}

impl Ff {
    fn new(params: &ParameterSet) -> Self {
        let k = param_or(params, "k", 4.0);
        Self {
            k_pri: param_or(params, "k_pri", k) as usize,
            k_bkp: param_or(params, "k_bkp", k) as usize,
        }
    }
}

pub fn create(params: &ParameterSet) -> Box<dyn ProvisioningScheme> {
    Box::new(Ff::new(params))
}

impl fmt::Display for Ff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ff(k_pri={}, k_bkp={})", self.k_pri, self.k_bkp)
    }
}

impl ProvisioningScheme for Ff {
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
        let bkp = match select_backup_first_fit(topo, state, &pri.path, &candidates, request.bandwidth) {
            Ok(b) => b,
            Err(reason) => return super::blocked(request.bandwidth, reason),
        };

        success(pri, bkp, request.bandwidth)
    }

    fn param_help(&self) -> &'static str {
        "k_pri: number of primary candidates to try (default: k)\nk_bkp: number of backup candidates to try (default: k)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provisioning::ProvisioningState;
    use crate::topology::Topology;

    #[test]
    fn blocks_backup_on_two_node_graph() {
        let topo = Topology::from_edges(2, vec![(0, 1, 100), (1, 0, 100)]);
        let state = NetworkState::new(topo.num_links());
        let mut pad = Scratchpad::new(&topo);
        let mut scheme = Ff::new(&ParameterSet::new());
        let request = Request { source: topo.node(0), destination: topo.node(1), bandwidth: 1 };
        let p = scheme.provision(&topo, &state, &mut pad, &request);
        assert_eq!(p.state, ProvisioningState::BlockSecNoPath);
    }

    #[test]
    fn provisions_shared_backup_on_triangle() {
        let topo = Topology::from_edges(
            3,
            vec![(0, 1, 100), (1, 0, 100), (0, 2, 100), (2, 0, 100), (1, 2, 100), (2, 1, 100)],
        );
        let mut state = NetworkState::new(topo.num_links());
        let mut pad = Scratchpad::new(&topo);
        let mut scheme = Ff::new(&ParameterSet::new());
        let request = Request { source: topo.node(0), destination: topo.node(1), bandwidth: 1 };
        let p = scheme.provision(&topo, &state, &mut pad, &request);
        assert_eq!(p.state, ProvisioningState::Success);
        assert_eq!(p.pri_path.len(), 1);
        assert_eq!(p.bkp_path.len(), 2);
        state.provision(&p);
        state.sanity_check(&[p]);
    }
}
