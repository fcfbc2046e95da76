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

//! Statistics aggregator: blocking/provisioning counters and time-weighted performance
//! metrics, with warm-up discard support.

use crate::provisioning::{Provisioning, ProvisioningState};
use std::ops::{AddAssign, Div, Mul};

/// A snapshot of instantaneous network-wide performance metrics, as returned by
/// [`crate::network_state::NetworkState::perf_metrics`]. Time-weighted integration
/// (`snapshot * dt`, accumulated with `+=`, finally divided by total elapsed time) turns a
/// sequence of snapshots into the averaged figures that appear in the output table.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerfMetrics {
    /// Ratio of total backup lightpath slot-reservations to distinct backup-reserved spectrum;
    /// >= 1 whenever sharing is occurring.
    pub sharability: f64,
    /// Fragmentation measure within the primary-occupied region of the spectrum.
    pub pri_frag: f64,
    /// Fragmentation measure within the backup-occupied region of the spectrum.
    pub bkp_frag: f64,
    /// `pri_frag + bkp_frag`.
    pub total_frag: f64,
    /// Mean index one past the last primary-occupied slot, across links.
    pub pri_end: f64,
    /// Mean index of the first backup-only-occupied slot, across links.
    pub bkp_begin: f64,
    /// Cumulative count of backup slot-reservations saved by sharing so far.
    pub collisions: f64,
    /// Fraction of total spectrum capacity currently occupied (primary or backup).
    pub utilization: f64,
    /// Static (topology-dependent, connection-independent) energy draw.
    pub e_stat: f64,
    /// Dynamic (active-connection-dependent) energy draw.
    pub e_dyn: f64,
    /// Number of links in the topology, carried along so per-link metrics can be normalised or
    /// re-aggregated downstream without re-consulting the topology.
    pub num_links: f64,
}

impl Mul<f64> for PerfMetrics {
    type Output = PerfMetrics;
    fn mul(self, dt: f64) -> PerfMetrics {
        PerfMetrics {
            sharability: self.sharability * dt,
            pri_frag: self.pri_frag * dt,
            bkp_frag: self.bkp_frag * dt,
            total_frag: self.total_frag * dt,
            pri_end: self.pri_end * dt,
            bkp_begin: self.bkp_begin * dt,
            collisions: self.collisions * dt,
            utilization: self.utilization * dt,
            e_stat: self.e_stat * dt,
            e_dyn: self.e_dyn * dt,
            num_links: self.num_links * dt,
        }
    }
}

impl Div<f64> for PerfMetrics {
    type Output = PerfMetrics;
    fn div(self, total_time: f64) -> PerfMetrics {
        if total_time == 0.0 {
            return self;
        }
        PerfMetrics {
            sharability: self.sharability / total_time,
            pri_frag: self.pri_frag / total_time,
            bkp_frag: self.bkp_frag / total_time,
            total_frag: self.total_frag / total_time,
            pri_end: self.pri_end / total_time,
            bkp_begin: self.bkp_begin / total_time,
            collisions: self.collisions / total_time,
            utilization: self.utilization / total_time,
            e_stat: self.e_stat / total_time,
            e_dyn: self.e_dyn / total_time,
            num_links: self.num_links / total_time,
        }
    }
}

impl AddAssign for PerfMetrics {
    fn add_assign(&mut self, rhs: PerfMetrics) {
        self.sharability += rhs.sharability;
        self.pri_frag += rhs.pri_frag;
        self.bkp_frag += rhs.bkp_frag;
        self.total_frag += rhs.total_frag;
        self.pri_end += rhs.pri_end;
        self.bkp_begin += rhs.bkp_begin;
        self.collisions += rhs.collisions;
        self.utilization += rhs.utilization;
        self.e_stat += rhs.e_stat;
        self.e_dyn += rhs.e_dyn;
        self.num_links += rhs.num_links;
    }
}

/// Column order of the machine-readable output row, documented here so the CLI layer and tests
/// agree on a single source of truth.
pub const TABLE_HEADER: &str = "nProvisioned;nBlocked;bwProvisioned;bwBlocked;nTerminated;bwTerminated;\
sharability;priFrag;bkpFrag;totalFrag;priEnd;bkpBegin;collisions;utilization;eStat;eDyn";

/// Per-job counters and time-weighted performance accumulator, with warm-up discard.
#[derive(Debug, Clone, Default)]
pub struct StatCounter {
    /// Remaining number of provision/block events to discard before counting starts.
    discard_budget: u64,

    /// Successfully provisioned connections.
    pub n_provisioned: u64,
    /// Blocked connection attempts (any reason).
    pub n_blocked: u64,
    /// Blocked due to no primary path.
    pub n_blocked_pri_no_path: u64,
    /// Blocked due to no primary spectrum.
    pub n_blocked_pri_no_spec: u64,
    /// Blocked due to no backup path.
    pub n_blocked_sec_no_path: u64,
    /// Blocked due to no backup spectrum.
    pub n_blocked_sec_no_spec: u64,
    /// Terminated (expired) connections.
    pub n_terminated: u64,

    /// Bandwidth-weighted companions of the above.
    pub bw_provisioned: u64,
    /// See [`StatCounter::bw_provisioned`].
    pub bw_blocked: u64,
    /// See [`StatCounter::bw_provisioned`].
    pub bw_terminated: u64,

    /// Time-weighted integral of [`PerfMetrics`] snapshots.
    pub perf: PerfMetrics,
    /// Total elapsed simulation time the integral above was accumulated over.
    pub total_time: f64,
    previous_time: f64,
}

impl StatCounter {
    /// Creates a counter that discards the first `discard_budget` provision/block events.
    pub fn new(discard_budget: u64) -> Self {
        Self { discard_budget, ..Default::default() }
    }

    /// Records the outcome of one provisioning attempt, honouring the discard budget.
    pub fn count_provisioning(&mut self, p: &Provisioning) {
        if self.discard_budget > 0 {
            self.discard_budget -= 1;
            return;
        }
        match p.state {
            ProvisioningState::Success => {
                self.n_provisioned += 1;
                self.bw_provisioned += p.bandwidth as u64;
            }
            ProvisioningState::BlockPriNoPath => {
                self.n_blocked += 1;
                self.n_blocked_pri_no_path += 1;
                self.bw_blocked += p.bandwidth as u64;
            }
            ProvisioningState::BlockPriNoSpec => {
                self.n_blocked += 1;
                self.n_blocked_pri_no_spec += 1;
                self.bw_blocked += p.bandwidth as u64;
            }
            ProvisioningState::BlockSecNoPath => {
                self.n_blocked += 1;
                self.n_blocked_sec_no_path += 1;
                self.bw_blocked += p.bandwidth as u64;
            }
            ProvisioningState::BlockSecNoSpec => {
                self.n_blocked += 1;
                self.n_blocked_sec_no_spec += 1;
                self.bw_blocked += p.bandwidth as u64;
            }
        }
        debug_assert_eq!(
            self.n_blocked,
            self.n_blocked_pri_no_path
                + self.n_blocked_pri_no_spec
                + self.n_blocked_sec_no_path
                + self.n_blocked_sec_no_spec
        );
    }

    /// Records a termination, honouring the discard budget (terminations of discarded
    /// connections are simply not counted; no separate counter is decremented).
    pub fn count_termination(&mut self, p: &Provisioning) {
        if self.discard_budget > 0 {
            return;
        }
        self.n_terminated += 1;
        self.bw_terminated += p.bandwidth as u64;
    }

    /// Integrates a network-state snapshot over `[previous_time, t)`.
    pub fn count_network_state(&mut self, snapshot: PerfMetrics, t: f64) {
        let dt = t - self.previous_time;
        if dt > 0.0 {
            self.perf += snapshot * dt;
            self.total_time += dt;
        }
        self.previous_time = t;
    }

    /// Blocking probability: `n_blocked / (n_provisioned + n_blocked)`.
    pub fn blocking_probability(&self) -> f64 {
        let total = self.n_provisioned + self.n_blocked;
        if total == 0 {
            0.0
        } else {
            self.n_blocked as f64 / total as f64
        }
    }

    /// Bandwidth blocking probability: `bw_blocked / (bw_provisioned + bw_blocked)`.
    pub fn bandwidth_blocking_probability(&self) -> f64 {
        let total = self.bw_provisioned + self.bw_blocked;
        if total == 0 {
            0.0
        } else {
            self.bw_blocked as f64 / total as f64
        }
    }

    /// Time-averaged performance metrics (`perf / total_time`).
    pub fn averaged_perf(&self) -> PerfMetrics {
        self.perf / self.total_time
    }

    /// Renders one `;`-delimited output row, in [`TABLE_HEADER`] column order.
    pub fn to_row(&self) -> String {
        let avg = self.averaged_perf();
        format!(
            "{};{};{};{};{};{};{};{};{};{};{};{};{};{};{};{}",
            self.n_provisioned,
            self.n_blocked,
            self.bw_provisioned,
            self.bw_blocked,
            self.n_terminated,
            self.bw_terminated,
            avg.sharability,
            avg.pri_frag,
            avg.bkp_frag,
            avg.total_frag,
            avg.pri_end,
            avg.bkp_begin,
            avg.collisions,
            avg.utilization,
            avg.e_stat,
            avg.e_dyn,
        )
    }

    /// A short, human-readable rendering for progress/console output (as opposed to
    /// [`StatCounter::to_row`], which is always plain ASCII for the machine-readable table).
    pub fn summary(&self) -> String {
        format!(
            "blocking={:.4} bw-blocking={:.4} provisioned={} blocked={} terminated={}",
            self.blocking_probability(),
            self.bandwidth_blocking_probability(),
            self.n_provisioned,
            self.n_blocked,
            self.n_terminated,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modulation::Modulation;

    fn success(bw: u32) -> Provisioning {
        let mut p = Provisioning::blocked(bw, ProvisioningState::BlockSecNoPath);
        p.state = ProvisioningState::Success;
        p.pri_mod = Modulation::Qam64;
        p.bkp_mod = Modulation::Qam64;
        p
    }

    #[test]
    fn discard_budget_suppresses_counting() {
        let mut s = StatCounter::new(2);
        s.count_provisioning(&success(10));
        s.count_provisioning(&success(10));
        assert_eq!(s.n_provisioned, 0);
        s.count_provisioning(&success(10));
        assert_eq!(s.n_provisioned, 1);
    }

    #[test]
    fn blocked_reason_breakdown_sums_to_total() {
        let mut s = StatCounter::new(0);
        s.count_provisioning(&Provisioning::blocked(1, ProvisioningState::BlockPriNoPath));
        s.count_provisioning(&Provisioning::blocked(1, ProvisioningState::BlockSecNoSpec));
        assert_eq!(s.n_blocked, 2);
        assert_eq!(s.n_blocked_pri_no_path, 1);
        assert_eq!(s.n_blocked_sec_no_spec, 1);
    }

    #[test]
    fn time_weighted_average_matches_constant_snapshot() {
        let mut s = StatCounter::new(0);
        let snap = PerfMetrics { utilization: 0.5, ..Default::default() };
        s.count_network_state(snap, 10.0);
        s.count_network_state(snap, 20.0);
        assert_approx_eq::assert_approx_eq!(s.averaged_perf().utilization, 0.5);
    }
}
