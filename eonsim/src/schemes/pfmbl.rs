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

//! PFMBL (Tarhan-style): primary as in [`super::ff`]; backup chosen by last-fit, minimising
//! `(NUM_SLOTS - start) * c1 + slots_needed * 1000` across candidates (or by pure last-fit
//! position when `c1 == 0`). Because the cost is monotonic in the window's start slot, the
//! last-fit placement is always the minimum-cost placement for a given candidate path, so each
//! candidate contributes at most one placement to the comparison.

use super::{backup_candidates, select_primary_first_fit, success, Placement};
use crate::bitset::NUM_SLOTS;
use crate::modulation;
use crate::network_state::NetworkState;
use crate::provisioning::{param_or, ParameterSet, Provisioning, ProvisioningScheme, ProvisioningState, Request};
use crate::scratchpad::Scratchpad;
use crate::topology::Topology;
use std::fmt;

/// `k_pri`/`k_bkp` default to the global `k`; `c1` defaults to 0.88, expressed per-slot rather
/// than pre-multiplied by the slot-width constant.
pub struct Pfmbl {
    k_pri: usize,
    k_bkp: usize,
    c1: f64,
}

impl Pfmbl {
    fn new(params: &ParameterSet) -> Self {
        let k = param_or(params, "k", 4.0);
        Self {
            k_pri: param_or(params, "k_pri", k) as usize,
            k_bkp: param_or(params, "k_bkp", k) as usize,
            c1: param_or(params, "c1", 0.88),
        }
    }
}

pub fn create(params: &ParameterSet) -> Box<dyn ProvisioningScheme> {
    Box::new(Pfmbl::new(params))
}

impl fmt::Display for Pfmbl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.c1 != 0.0 {
            write!(f, "pfmbl_1(k_pri={}, k_bkp={}, c1={})", self.k_pri, self.k_bkp, self.c1)
        } else {
            write!(f, "pfmbl_0(k_pri={}, k_bkp={})", self.k_pri, self.k_bkp)
        }
    }
}

impl ProvisioningScheme for Pfmbl {
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
        if candidates.is_empty() {
            return super::blocked(request.bandwidth, ProvisioningState::BlockSecNoPath);
        }

        let mut best: Option<(f64, Placement)> = None;
        for c in &candidates {
            let distance: u32 = c.links.iter().map(|ld| topo.link_length(ld.link)).sum();
            let m = modulation::choose(distance);
            if m == modulation::Modulation::None {
                break;
            }
            let width = modulation::slots_needed(request.bandwidth, m) as usize;
            let avail = state.bkp_availability_path(&pri.path, &c.links);
            let begin = match avail.last_fit(width) {
                Some(b) => b,
                None => continue,
            };
            let cost = if self.c1 != 0.0 {
                (NUM_SLOTS - begin) as f64 * self.c1 + width as f64 * 1000.0
            } else {
                (NUM_SLOTS - begin) as f64
            };
            if best.as_ref().map(|(b, _)| cost < *b).unwrap_or(true) {
                best = Some((
                    cost,
                    Placement { path: c.links.clone(), begin, end: begin + width, modulation: m },
                ));
            }
        }

        match best {
            Some((_, bkp)) => success(pri, bkp, request.bandwidth),
            None => super::blocked(request.bandwidth, ProvisioningState::BlockSecNoSpec),
        }
    }

    fn param_help(&self) -> &'static str {
        "k_pri: number of primary candidates to try (default: k)\n\
         k_bkp: number of backup candidates to try (default: k)\n\
         c1: weight of the distance-from-band-edge term (default: 0.88; 0 means pure last-fit)"
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
        let mut scheme = Pfmbl::new(&ParameterSet::new());
        let request = Request { source: topo.node(0), destination: topo.node(1), bandwidth: 1 };
        let p = scheme.provision(&topo, &state, &mut pad, &request);
        assert_eq!(p.state, ProvisioningState::Success);
        state.provision(&p);
        state.sanity_check(&[p]);
    }

    #[test]
    fn zero_c1_still_places_backup() {
        let topo = triangle();
        let state = NetworkState::new(topo.num_links());
        let mut pad = Scratchpad::new(&topo);
        let mut params = ParameterSet::new();
        params.insert("c1".into(), 0.0);
        let mut scheme = Pfmbl::new(&params);
        let request = Request { source: topo.node(0), destination: topo.node(1), bandwidth: 1 };
        let p = scheme.provision(&topo, &state, &mut pad, &request);
        assert_eq!(p.state, ProvisioningState::Success);
    }
}
