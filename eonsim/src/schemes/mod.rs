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

//! Built-in provisioning-scheme heuristics and their common plumbing.
//!
//! Every scheme shares the same two-stage shape: pick a primary path and slot window, mask its
//! links, then pick a link-disjoint backup path and window. What differs between them is *how*
//! a window is chosen once candidates are on the table; the shared helpers in this module take
//! that choice as a closure so each scheme file only states its own cost function.

pub mod ff;
pub mod ksq;
pub mod mfsb;
pub mod pfmbl;
pub mod shortest_fflf;

use crate::bitset::{SlotBitmap, NUM_SLOTS};
use crate::modulation::{self, Modulation};
use crate::network_state::NetworkState;
use crate::pathsearch::YenPath;
use crate::provisioning::{ProvisioningState, Registry};
use crate::scratchpad::Scratchpad;
use crate::topology::{LinkDescriptor, Topology};

/// Registers every built-in scheme under its canonical name.
pub fn register_all(r: &Registry) {
    r.register("ff", ff::create);
    r.register("mfsb", mfsb::create);
    r.register("pfmbl", pfmbl::create);
    r.register("ksq", ksq::create);
    r.register("shortestfflf", shortest_fflf::create);
}

fn path_distance(topo: &Topology, path: &[LinkDescriptor]) -> u32 {
    path.iter().map(|ld| topo.link_length(ld.link)).sum()
}

fn mask_path_weights(pad: &mut Scratchpad, path: &[LinkDescriptor]) {
    for ld in path {
        pad.weights[ld.link.index()] = crate::scratchpad::INFINITE_WEIGHT;
    }
}

/// Every half-open `[begin, begin+width)` window that is entirely free in `avail`.
fn all_fits(avail: &SlotBitmap, width: usize) -> Vec<usize> {
    if width == 0 || width > NUM_SLOTS {
        return Vec::new();
    }
    (0..=(NUM_SLOTS - width)).filter(|&b| avail.range_is_free(b, b + width)).collect()
}

/// A path and modulation chosen for one end of a connection, plus its slot window.
struct Placement {
    path: Vec<LinkDescriptor>,
    begin: usize,
    end: usize,
    modulation: Modulation,
}

/// Runs Dijkstra-over-`pad.weights`-free primary selection shared by FF/MFSB/PFMBL: the first Yen
/// candidate (in non-decreasing length order, up to `k_pri` of them) on which a first-fit window
/// exists. Stops examining candidates as soon as one is unreachable by any modulation, since Yen
/// paths only get longer from there.
fn select_primary_first_fit(
    topo: &Topology,
    state: &NetworkState,
    pad: &mut Scratchpad,
    source: crate::topology::NodeId,
    destination: crate::topology::NodeId,
    bandwidth: u32,
    k_pri: usize,
) -> Result<Placement, ProvisioningState> {
    pad.reset_weights();
    let mut search = crate::pathsearch::YenSearch::new(source, destination);
    let paths = search.paths(k_pri, topo, pad);
    if paths.is_empty() {
        return Err(ProvisioningState::BlockPriNoPath);
    }
    for p in paths {
        let m = modulation::choose(path_distance(topo, &p.links));
        if m == Modulation::None {
            break;
        }
        let width = modulation::slots_needed(bandwidth, m) as usize;
        let avail = state.pri_availability(&p.links);
        if let Some(begin) = avail.first_fit(width) {
            return Ok(Placement { path: p.links.clone(), begin, end: begin + width, modulation: m });
        }
    }
    Err(ProvisioningState::BlockPriNoSpec)
}

/// Collects up to `k_bkp` Yen candidates for a backup link-disjoint from `pri_path`, restoring
/// `pad.weights` to native lengths before returning (the provisioning-scheme contract).
fn backup_candidates(
    topo: &Topology,
    pad: &mut Scratchpad,
    pri_path: &[LinkDescriptor],
    source: crate::topology::NodeId,
    destination: crate::topology::NodeId,
    k_bkp: usize,
) -> Vec<YenPath> {
    pad.reset_weights();
    mask_path_weights(pad, pri_path);
    let mut search = crate::pathsearch::YenSearch::new(source, destination);
    let result = search.paths(k_bkp, topo, pad).to_vec();
    pad.reset_weights();
    result
}

/// First-fit backup selection (FF): first candidate, in order, with a feasible window.
fn select_backup_first_fit(
    topo: &Topology,
    state: &NetworkState,
    pri_path: &[LinkDescriptor],
    candidates: &[YenPath],
    bandwidth: u32,
) -> Result<Placement, ProvisioningState> {
    if candidates.is_empty() {
        return Err(ProvisioningState::BlockSecNoPath);
    }
    for c in candidates {
        let m = modulation::choose(path_distance(topo, &c.links));
        if m == Modulation::None {
            break;
        }
        let width = modulation::slots_needed(bandwidth, m) as usize;
        let avail = state.bkp_availability_path(pri_path, &c.links);
        if let Some(begin) = avail.first_fit(width) {
            return Ok(Placement { path: c.links.clone(), begin, end: begin + width, modulation: m });
        }
    }
    Err(ProvisioningState::BlockSecNoSpec)
}

/// Backup selection by minimum cost (MFSB/PFMBL): scans every feasible window of every candidate
/// (stopping at the first candidate whose length exceeds every modulation's reach) and keeps the
/// lowest-cost one according to `cost_fn(path, begin, end)`.
fn select_backup_min_cost(
    topo: &Topology,
    state: &NetworkState,
    pri_path: &[LinkDescriptor],
    candidates: &[YenPath],
    bandwidth: u32,
    mut cost_fn: impl FnMut(&[LinkDescriptor], usize, usize) -> f64,
) -> Result<Placement, ProvisioningState> {
    if candidates.is_empty() {
        return Err(ProvisioningState::BlockSecNoPath);
    }
    let mut best: Option<(f64, Placement)> = None;
    for c in candidates {
        let m = modulation::choose(path_distance(topo, &c.links));
        if m == Modulation::None {
            break;
        }
        let width = modulation::slots_needed(bandwidth, m) as usize;
        let avail = state.bkp_availability_path(pri_path, &c.links);
        for begin in all_fits(&avail, width) {
            let end = begin + width;
            let cost = cost_fn(&c.links, begin, end);
            if best.as_ref().map(|(b, _)| cost < *b).unwrap_or(true) {
                best = Some((cost, Placement { path: c.links.clone(), begin, end, modulation: m }));
            }
        }
    }
    best.map(|(_, p)| p).ok_or(ProvisioningState::BlockSecNoSpec)
}

/// Backup selection via a single last-fit probe (used when PFMBL's cost weight is zero).
fn select_backup_last_fit(
    topo: &Topology,
    state: &NetworkState,
    pri_path: &[LinkDescriptor],
    candidates: &[YenPath],
    bandwidth: u32,
) -> Result<Placement, ProvisioningState> {
    if candidates.is_empty() {
        return Err(ProvisioningState::BlockSecNoPath);
    }
    for c in candidates {
        let m = modulation::choose(path_distance(topo, &c.links));
        if m == Modulation::None {
            break;
        }
        let width = modulation::slots_needed(bandwidth, m) as usize;
        let avail = state.bkp_availability_path(pri_path, &c.links);
        if let Some(begin) = avail.last_fit(width) {
            return Ok(Placement { path: c.links.clone(), begin, end: begin + width, modulation: m });
        }
    }
    Err(ProvisioningState::BlockSecNoSpec)
}

fn blocked(bandwidth: u32, reason: ProvisioningState) -> crate::provisioning::Provisioning {
    crate::provisioning::Provisioning::blocked(bandwidth, reason)
}

fn success(
    pri: Placement,
    bkp: Placement,
    bandwidth: u32,
) -> crate::provisioning::Provisioning {
    crate::provisioning::Provisioning {
        pri_path: pri.path,
        pri_spec_begin: pri.begin,
        pri_spec_end: pri.end,
        pri_mod: pri.modulation,
        bkp_path: bkp.path,
        bkp_spec_begin: bkp.begin,
        bkp_spec_end: bkp.end,
        bkp_mod: bkp.modulation,
        bandwidth,
        state: ProvisioningState::Success,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provisioning::{ParameterSet, ProvisioningScheme, Request};
    use crate::scratchpad::Scratchpad;
    use crate::topology::Topology;

    fn triangle() -> Topology {
        Topology::from_edges(
            3,
            vec![(0, 1, 100), (1, 0, 100), (0, 2, 100), (2, 0, 100), (1, 2, 100), (2, 1, 100)],
        )
    }

    #[test]
    fn every_builtin_scheme_provisions_on_a_triangle() {
        let topo = triangle();
        let state = NetworkState::new(topo.num_links());
        let mut pad = Scratchpad::new(&topo);
        let request = Request { source: topo.node(0), destination: topo.node(1), bandwidth: 1 };
        for name in &["ff", "mfsb", "pfmbl", "ksq", "shortestfflf"] {
            let mut scheme = match *name {
                "ff" => ff::create(&ParameterSet::new()),
                "mfsb" => mfsb::create(&ParameterSet::new()),
                "pfmbl" => pfmbl::create(&ParameterSet::new()),
                "ksq" => ksq::create(&ParameterSet::new()),
                "shortestfflf" => shortest_fflf::create(&ParameterSet::new()),
                _ => unreachable!(),
            };
            let p = scheme.provision(&topo, &state, &mut pad, &request);
            assert_eq!(
                p.state,
                ProvisioningState::Success,
                "{} failed to provision on an otherwise-empty triangle",
                name
            );
            assert_eq!(pad.weights, vec![100, 100, 100, 100, 100, 100], "{} left weights masked", name);
        }
    }
}
