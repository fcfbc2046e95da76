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

//! Spectrum bitmaps and the shared-backup sharing matrix -- the operational heart of the
//! simulator.
//!
//! Maintains, per link, `primary_use` and `any_use` slot bitmaps plus an `L x L` `sharing`
//! matrix, under the global invariant `any_use[b] == primary_use[b] | (OR over p of
//! sharing[b, p])`. `provision`/`terminate` are written to preserve that invariant incrementally;
//! [`NetworkState::sanity_check`] reverifies it (and per-connection slot bookkeeping) from
//! scratch, for use behind `debug_assert!` in the simulation loop.

use crate::bitset::SlotBitmap;
use crate::modulation;
use crate::provisioning::Provisioning;
use crate::stats::PerfMetrics;
use crate::topology::{LinkDescriptor, LinkId, Topology};

/// Spectrum state for every link of a topology, plus the cross-link backup sharing matrix.
#[derive(Debug, Clone)]
pub struct NetworkState {
    num_links: usize,
    primary_use: Vec<SlotBitmap>,
    any_use: Vec<SlotBitmap>,
    /// Flattened `L x L`; cell `(b, p)` lives at `b * num_links + p`.
    sharing: Vec<SlotBitmap>,

    /// Sum, over every currently-active connection, of `backup_width * backup_link_count` --
    /// the backup capacity that would be reserved with no sharing at all.
    total_bkp_lightpath_slots: u64,
    /// Distinct `(link, slot)` pairs currently occupied by a backup reservation (`any_use` true,
    /// `primary_use` false). Updated lazily, only on bit-transitions, rather than recomputed from
    /// the bitmaps on every query.
    current_bkp_slots: u64,
    /// Running sum of `energy_per_transponder` over every active primary and backup lightpath.
    active_transponder_energy: f64,
}

fn sharing_index(num_links: usize, b: usize, p: usize) -> usize {
    b * num_links + p
}

impl NetworkState {
    /// Creates an all-zero state for a topology with `num_links` links.
    pub fn new(num_links: usize) -> Self {
        Self {
            num_links,
            primary_use: vec![SlotBitmap::empty(); num_links],
            any_use: vec![SlotBitmap::empty(); num_links],
            sharing: vec![SlotBitmap::empty(); num_links * num_links],
            total_bkp_lightpath_slots: 0,
            current_bkp_slots: 0,
            active_transponder_energy: 0.0,
        }
    }

    /// Zeroes every bitmap and counter; called between jobs.
    pub fn reset(&mut self) {
        for b in self.primary_use.iter_mut() {
            *b = SlotBitmap::empty();
        }
        for b in self.any_use.iter_mut() {
            *b = SlotBitmap::empty();
        }
        for b in self.sharing.iter_mut() {
            *b = SlotBitmap::empty();
        }
        self.total_bkp_lightpath_slots = 0;
        self.current_bkp_slots = 0;
        self.active_transponder_energy = 0.0;
    }

    fn sharing_cell(&self, b: LinkId, p: LinkId) -> SlotBitmap {
        self.sharing[sharing_index(self.num_links, b.index(), p.index())]
    }

    // ---- Queries -----------------------------------------------------------------------

    /// OR of `any_use[l]` over every link of `path`: a zero bit is free on every link.
    pub fn pri_availability(&self, path: &[LinkDescriptor]) -> SlotBitmap {
        path.iter().fold(SlotBitmap::empty(), |acc, ld| acc | self.any_use[ld.link.index()])
    }

    /// `primary_use[bkp_link] | (OR over p in pri_path of sharing[bkp_link, p])`: a zero bit can
    /// carry a backup for `pri_path` on `bkp_link` without risking simultaneous failure.
    pub fn bkp_availability_link(&self, pri_path: &[LinkDescriptor], bkp_link: LinkId) -> SlotBitmap {
        let mut avail = self.primary_use[bkp_link.index()];
        for p in pri_path {
            avail |= self.sharing_cell(bkp_link, p.link);
        }
        avail
    }

    /// OR of [`NetworkState::bkp_availability_link`] across every link of `bkp_path`.
    pub fn bkp_availability_path(&self, pri_path: &[LinkDescriptor], bkp_path: &[LinkDescriptor]) -> SlotBitmap {
        bkp_path
            .iter()
            .fold(SlotBitmap::empty(), |acc, b| acc | self.bkp_availability_link(pri_path, b.link))
    }

    /// Number of links in `path` where `slot_index` is free (`any_use` bit clear).
    pub fn count_free_blocks(&self, path: &[LinkDescriptor], slot_index: usize) -> usize {
        path.iter().filter(|ld| !self.any_use[ld.link.index()].get(slot_index)).count()
    }

    /// Sum of [`NetworkState::count_free_blocks`] across `[begin, end)`.
    pub fn count_free_blocks_range(&self, path: &[LinkDescriptor], begin: usize, end: usize) -> usize {
        (begin..end).map(|i| self.count_free_blocks(path, i)).sum()
    }

    /// Count of links in `path` where both boundary slots (`begin - 1` and `end`) are free --
    /// placing an allocation at `[begin, end)` would create a new fragment there. Ambiguous at the
    /// band edge, so (matching the original engine) the whole path scores zero cuts whenever
    /// `begin == 0` or `end == NUM_SLOTS`.
    pub fn calc_cuts(&self, path: &[LinkDescriptor], begin: usize, end: usize) -> usize {
        if begin == 0 || end == crate::bitset::NUM_SLOTS {
            return 0;
        }
        path.iter()
            .filter(|ld| {
                let any = self.any_use[ld.link.index()];
                !any.get(begin - 1) && !any.get(end)
            })
            .count()
    }

    /// For each link of `path`, the fraction of free slots in `[begin, end)` on the *other*
    /// out-edges of that link's source node, divided by the source node's full out-degree (not
    /// just the sibling count), summed over `path`. Measures how much an allocation would
    /// misalign the spectrum relative to sibling links leaving the same node.
    pub fn calc_misalignments(&self, topo: &Topology, path: &[LinkDescriptor], begin: usize, end: usize) -> f64 {
        let mut total = 0.0;
        for ld in path {
            let out_degree = topo.out_edges(ld.source).count();
            if out_degree == 0 {
                continue;
            }
            let siblings = topo.out_edges(ld.source).filter(|o| o.link != ld.link);
            let free: usize = siblings
                .map(|o| (end - begin) - self.any_use[o.link.index()].count_ones_in_range(begin, end) as usize)
                .sum();
            total += free as f64 / out_degree as f64;
        }
        total
    }

    /// Snapshot of instantaneous performance metrics.
    pub fn perf_metrics(&self, topo: &Topology) -> PerfMetrics {
        use crate::bitset::NUM_SLOTS;

        let l = self.num_links;
        let total_capacity = (NUM_SLOTS as u64) * (l as u64);
        let used: u64 = self.any_use.iter().map(|b| b.count_ones() as u64).sum();
        let utilization = if total_capacity == 0 { 0.0 } else { used as f64 / total_capacity as f64 };

        let mut pri_end_sum = 0.0;
        let mut bkp_begin_sum = 0.0;
        let mut pri_frag_sum = 0.0;
        let mut bkp_frag_sum = 0.0;
        for l in 0..self.num_links {
            let pri = self.primary_use[l];
            let any = self.any_use[l];
            let backup_only_or_above = |s: usize| any.get(s) && !pri.get(s);

            let pri_end = (0..NUM_SLOTS).rev().find(|&i| pri.get(i)).map(|i| i + 1).unwrap_or(0);
            let bkp_begin = (0..NUM_SLOTS).find(|&i| backup_only_or_above(i)).unwrap_or(NUM_SLOTS);
            pri_end_sum += pri_end as f64;
            bkp_begin_sum += bkp_begin as f64;

            let pri_holes = (0..pri_end).filter(|&i| !pri.get(i)).count();
            pri_frag_sum += pri_holes as f64;
            let bkp_holes = (bkp_begin..NUM_SLOTS).filter(|&i| !backup_only_or_above(i)).count();
            bkp_frag_sum += bkp_holes as f64;
        }
        let n = self.num_links.max(1) as f64;

        let mut e_stat = 0.0;
        let mut idle_amps = 0.0;
        let mut total_amps = 0.0;
        for idx in 0..self.num_links {
            let link = petgraph::stable_graph::EdgeIndex::new(idx);
            let amps = topo.num_amplifiers(link) as f64;
            total_amps += amps;
            if self.any_use[idx].is_empty() {
                idle_amps += amps;
            }
        }
        e_stat += (self.num_links as f64 / 2.0) * 85.0;
        e_stat += topo.num_nodes() as f64 * 150.0;
        e_stat += (total_amps / 2.0) * 140.0;
        let e_dyn = (total_amps - idle_amps) * 30.0 + self.active_transponder_energy;

        let collisions = (self.total_bkp_lightpath_slots as f64 - self.current_bkp_slots as f64).max(0.0);
        let sharability = if self.current_bkp_slots == 0 {
            if self.total_bkp_lightpath_slots == 0 { 0.0 } else { 1.0 }
        } else {
            self.total_bkp_lightpath_slots as f64 / self.current_bkp_slots as f64
        };

        PerfMetrics {
            sharability,
            pri_frag: pri_frag_sum / n,
            bkp_frag: bkp_frag_sum / n,
            total_frag: (pri_frag_sum + bkp_frag_sum) / n,
            pri_end: pri_end_sum / n,
            bkp_begin: bkp_begin_sum / n,
            collisions,
            utilization,
            e_stat,
            e_dyn,
            num_links: self.num_links as f64,
        }
    }

    // ---- Mutations -----------------------------------------------------------------------

    /// Commits a successful provisioning: sets primary bits, sets backup `any_use`/`sharing`
    /// bits, and updates the running counters used by [`NetworkState::perf_metrics`].
    pub fn provision(&mut self, p: &Provisioning) {
        debug_assert_eq!(p.state, crate::provisioning::ProvisioningState::Success);
        for ld in &p.pri_path {
            let l = ld.link.index();
            for i in p.pri_spec_begin..p.pri_spec_end {
                debug_assert!(!self.primary_use[l].get(i), "primary slot already occupied");
                debug_assert!(!self.any_use[l].get(i), "slot already occupied");
                self.primary_use[l].set(i);
                self.any_use[l].set(i);
            }
        }
        self.active_transponder_energy += modulation::energy_per_transponder(p.pri_mod);

        let width = (p.bkp_spec_end - p.bkp_spec_begin) as u64;
        self.total_bkp_lightpath_slots += width * p.bkp_path.len() as u64;

        for bd in &p.bkp_path {
            debug_assert!(
                !p.pri_path.iter().any(|pd| pd.link == bd.link),
                "backup path must be link-disjoint from the primary"
            );
            let b = bd.link.index();
            for i in p.bkp_spec_begin..p.bkp_spec_end {
                let was_occupied = self.any_use[b].get(i);
                self.any_use[b].set(i);
                if !was_occupied {
                    self.current_bkp_slots += 1;
                }
            }
            for pd in &p.pri_path {
                let idx = sharing_index(self.num_links, b, pd.link.index());
                for i in p.bkp_spec_begin..p.bkp_spec_end {
                    debug_assert!(!self.sharing[idx].get(i), "sharing slot already reserved for this (b, p) pair");
                    self.sharing[idx].set(i);
                }
            }
        }
        self.active_transponder_energy += modulation::energy_per_transponder(p.bkp_mod);
    }

    /// Reverses a provisioning: clears primary bits, clears the relevant `sharing` cells, then
    /// rebuilds `any_use` on every backup link from scratch (`primary_use | OR_q sharing[b, q]`)
    /// since the slot may still be needed by another connection's shared backup.
    pub fn terminate(&mut self, p: &Provisioning) {
        for ld in &p.pri_path {
            let l = ld.link.index();
            for i in p.pri_spec_begin..p.pri_spec_end {
                debug_assert!(self.primary_use[l].get(i));
                self.primary_use[l].clear(i);
                self.any_use[l].clear(i);
            }
        }
        self.active_transponder_energy -= modulation::energy_per_transponder(p.pri_mod);

        self.total_bkp_lightpath_slots -=
            (p.bkp_spec_end - p.bkp_spec_begin) as u64 * p.bkp_path.len() as u64;

        for bd in &p.bkp_path {
            let b = bd.link.index();
            let before = self.any_use[b];

            for pd in &p.pri_path {
                let idx = sharing_index(self.num_links, b, pd.link.index());
                for i in p.bkp_spec_begin..p.bkp_spec_end {
                    self.sharing[idx].clear(i);
                }
            }

            let mut rebuilt = self.primary_use[b];
            for q in 0..self.num_links {
                if q == b {
                    continue;
                }
                rebuilt |= self.sharing[sharing_index(self.num_links, b, q)];
            }
            self.any_use[b] = rebuilt;

            for i in 0..crate::bitset::NUM_SLOTS {
                if before.get(i) && !rebuilt.get(i) {
                    self.current_bkp_slots -= 1;
                }
            }
        }
        self.active_transponder_energy -= modulation::energy_per_transponder(p.bkp_mod);
    }

    /// Re-derives every invariant from scratch against the set of currently active
    /// provisionings and panics if any is violated. Intended to run behind `debug_assert!`;
    /// compiled out entirely in release builds.
    pub fn sanity_check(&self, active: &[Provisioning]) {
        let mut expect_primary = vec![SlotBitmap::empty(); self.num_links];
        let mut expect_sharing = vec![SlotBitmap::empty(); self.num_links * self.num_links];
        for p in active {
            for ld in &p.pri_path {
                expect_primary[ld.link.index()].set_range(p.pri_spec_begin, p.pri_spec_end);
            }
            for bd in &p.bkp_path {
                for pd in &p.pri_path {
                    let idx = sharing_index(self.num_links, bd.link.index(), pd.link.index());
                    expect_sharing[idx].set_range(p.bkp_spec_begin, p.bkp_spec_end);
                }
            }
        }
        assert_eq!(expect_primary, self.primary_use, "primary_use diverged from active connections");
        assert_eq!(expect_sharing, self.sharing, "sharing matrix diverged from active connections");

        for b in 0..self.num_links {
            let mut expect_any = self.primary_use[b];
            for p in 0..self.num_links {
                expect_any |= self.sharing[sharing_index(self.num_links, b, p)];
            }
            assert_eq!(expect_any, self.any_use[b], "sharing-consistency invariant violated on link {}", b);
            assert!(
                (self.primary_use[b] & self.sharing_cell(LinkId::new(b), LinkId::new(b))).is_empty(),
                "sharing[b, b] must be empty"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modulation::Modulation;
    use crate::provisioning::ProvisioningState;
    use crate::topology::Topology;

    fn triangle() -> Topology {
        Topology::from_edges(
            3,
            vec![(0, 1, 100), (1, 0, 100), (0, 2, 100), (2, 0, 100), (1, 2, 100), (2, 1, 100)],
        )
    }

    fn link(topo: &Topology, u: usize, v: usize) -> LinkDescriptor {
        let l = topo.edge(topo.node(u), topo.node(v)).unwrap();
        LinkDescriptor { source: topo.node(u), link: l }
    }

    #[test]
    fn provision_sets_expected_bits_and_passes_sanity_check() {
        let topo = triangle();
        let mut state = NetworkState::new(topo.num_links());
        let p = Provisioning {
            pri_path: vec![link(&topo, 0, 1)],
            pri_spec_begin: 0,
            pri_spec_end: 2,
            pri_mod: Modulation::Qam64,
            bkp_path: vec![link(&topo, 0, 2), link(&topo, 2, 1)],
            bkp_spec_begin: 0,
            bkp_spec_end: 2,
            bkp_mod: Modulation::Qam64,
            bandwidth: 1,
            state: ProvisioningState::Success,
        };
        state.provision(&p);

        let pri_avail = state.pri_availability(&[link(&topo, 0, 1)]);
        assert!(pri_avail.get(0) && pri_avail.get(1));
        let bkp_avail = state.bkp_availability_path(&p.pri_path, &p.bkp_path);
        assert!(bkp_avail.get(0) && bkp_avail.get(1));

        state.sanity_check(&[p]);
    }

    #[test]
    fn terminate_keeps_surviving_sharer_any_use_set() {
        let topo = triangle();
        let mut state = NetworkState::new(topo.num_links());

        let p1 = Provisioning {
            pri_path: vec![link(&topo, 0, 1)],
            pri_spec_begin: 0,
            pri_spec_end: 2,
            pri_mod: Modulation::Qam64,
            bkp_path: vec![link(&topo, 0, 2), link(&topo, 2, 1)],
            bkp_spec_begin: 0,
            bkp_spec_end: 2,
            bkp_mod: Modulation::Qam64,
            bandwidth: 1,
            state: ProvisioningState::Success,
        };
        // A second connection 2->1 direct, sharing backup link 0->2 with a *different* p.
        let p2 = Provisioning {
            pri_path: vec![link(&topo, 2, 1)],
            pri_spec_begin: 0,
            pri_spec_end: 2,
            pri_mod: Modulation::Qam64,
            bkp_path: vec![link(&topo, 0, 2)],
            bkp_spec_begin: 0,
            bkp_spec_end: 2,
            bkp_mod: Modulation::Qam64,
            bandwidth: 1,
            state: ProvisioningState::Success,
        };

        state.provision(&p1);
        state.provision(&p2);
        state.sanity_check(&[p1.clone(), p2.clone()]);

        state.terminate(&p1);
        state.sanity_check(&[p2.clone()]);

        let b = link(&topo, 0, 2).link.index();
        assert!(state.any_use[b].get(0) && state.any_use[b].get(1), "surviving sharer must keep any_use set");

        let p1_sharing = sharing_index(state.num_links, b, link(&topo, 0, 1).link.index());
        assert!(state.sharing[p1_sharing].is_empty(), "terminated connection's sharing cell must clear");
    }

    #[test]
    fn reset_zeroes_everything() {
        let topo = triangle();
        let mut state = NetworkState::new(topo.num_links());
        let p = Provisioning {
            pri_path: vec![link(&topo, 0, 1)],
            pri_spec_begin: 0,
            pri_spec_end: 2,
            pri_mod: Modulation::Qam64,
            bkp_path: vec![link(&topo, 0, 2), link(&topo, 2, 1)],
            bkp_spec_begin: 0,
            bkp_spec_end: 2,
            bkp_mod: Modulation::Qam64,
            bandwidth: 1,
            state: ProvisioningState::Success,
        };
        state.provision(&p);
        state.terminate(&p);
        state.reset();
        assert_eq!(state.total_bkp_lightpath_slots, 0);
        assert_eq!(state.current_bkp_slots, 0);
        for b in &state.any_use {
            assert!(b.is_empty());
        }
    }
}
