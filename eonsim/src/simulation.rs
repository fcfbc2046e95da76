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

//! Event-driven simulation loop: interleaves exponential inter-arrival/holding events,
//! drives a provisioning heuristic, and records time-weighted state samples.

use crate::job::Job;
use crate::network_state::NetworkState;
use crate::provisioning::{ParameterSet, Provisioning, ProvisioningState, Request, REGISTRY};
use crate::scratchpad::Scratchpad;
use crate::stats::StatCounter;
use crate::topology::Topology;
use log::warn;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::collections::BTreeMap;

/// Mean inter-arrival time, in the same time units as holding times; load scales the mean
/// holding time relative to this constant.
pub const AVG_INTARRIVAL: f64 = 1000.0;
/// Spectrum slot width, used to convert requested bandwidth into slot-equivalent units.
pub const SLOT_WIDTH: f64 = 12.5;
/// Default interval (in simulated events) between [`NetworkState::sanity_check`] invocations.
pub const SANITY_CHECK_INTERVAL: u64 = 1000;

/// Deterministically derives a per-job RNG seed from a base seed and the job's index, so that a
/// job's request sequence is reproducible regardless of which worker runs it, while distinct
/// jobs in the same sweep still see distinct traffic -- see the RNG resolution in the design
/// notes.
pub fn job_seed(base_seed: u64, job_index: u64) -> u64 {
    // splitmix64 finalizer, applied to `base_seed ^ job_index`.
    let mut z = base_seed ^ job_index.wrapping_add(0x9E3779B97F4A7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

fn draw_exp(rng: &mut SmallRng, mean: f64) -> u64 {
    let u: f64 = Uniform::new(f64::EPSILON, 1.0).sample(rng);
    (-mean * u.ln()).round().max(0.0) as u64
}

/// A single active (provisioned) connection, keyed in the active-connection table by its
/// expiry time.
struct ActiveConnection {
    provisioning: Provisioning,
}

/// Owns everything one worker needs to run a job end-to-end: a network state, a scratchpad, and
/// (implicitly, via the job) a freshly-instantiated heuristic.
pub struct Simulation {
    topo: Topology,
    state: NetworkState,
    scratchpad: Scratchpad,
    base_seed: u64,
}

impl Simulation {
    /// Creates a simulation bound to `topo` for the lifetime of the worker, with `base_seed`
    /// mixed into every job's derived seed.
    pub fn new(topo: Topology, base_seed: u64) -> Self {
        let scratchpad = Scratchpad::new(&topo);
        let num_links = topo.num_links();
        Self { topo, state: NetworkState::new(num_links), scratchpad, base_seed }
    }

    /// Runs one job to completion and returns its accumulated statistics. If the job names an
    /// unregistered algorithm, logs a warning and returns an empty (zeroed) [`StatCounter`]
    /// rather than failing the run.
    pub fn run(&mut self, job: &Job) -> StatCounter {
        let mut heuristic = match REGISTRY.create(&job.algorithm, &job.params) {
            Some(h) => h,
            None => {
                warn!("job {} names unregistered algorithm `{}`; skipping", job.index, job.algorithm);
                return StatCounter::new(0);
            }
        };

        let iters = param_u64(&job.params, "iters", 100_000);
        let discard = param_u64(&job.params, "discard", 10_000);
        let load = param_f64(&job.params, "load", 150.0);
        let bwmin = param_u64(&job.params, "bwmin", 10).max(1);
        let bwmax = param_u64(&job.params, "bwmax", 400).max(bwmin);

        let mut rng = SmallRng::seed_from_u64(job_seed(self.base_seed, job.index as u64));
        let num_nodes = self.topo.num_nodes();
        let node_dist = Uniform::new(0, num_nodes);
        let bw_dist = Uniform::new_inclusive(bwmin, bwmax);

        self.scratchpad.reset_weights();
        self.state.reset();

        let mut stats = StatCounter::new(discard);
        let mut active: BTreeMap<u64, Vec<ActiveConnection>> = BTreeMap::new();
        let mut current_time: u64 = 0;
        let mut next_request_time: u64 = draw_exp(&mut rng, AVG_INTARRIVAL);
        let mut events_since_check: u64 = 0;

        for _ in 0..iters {
            while let Some((&expiry, _)) = active.iter().next() {
                if expiry > next_request_time {
                    break;
                }
                current_time = expiry;
                let snapshot = self.state.perf_metrics(&self.topo);
                stats.count_network_state(snapshot, current_time as f64);

                let conns = active.remove(&expiry).unwrap();
                for conn in conns {
                    self.state.terminate(&conn.provisioning);
                    stats.count_termination(&conn.provisioning);
                }
                events_since_check += 1;
                self.maybe_sanity_check(&active, &mut events_since_check);
            }

            current_time = next_request_time;
            let snapshot = self.state.perf_metrics(&self.topo);
            stats.count_network_state(snapshot, current_time as f64);

            let source_idx = node_dist.sample(&mut rng);
            let mut dest_idx = Uniform::new(0, num_nodes.saturating_sub(1)).sample(&mut rng);
            if dest_idx >= source_idx {
                dest_idx += 1;
            }
            let bandwidth_raw = bw_dist.sample(&mut rng);
            let bandwidth = ((bandwidth_raw as f64) / SLOT_WIDTH).ceil() as u32;

            let request = Request {
                source: self.topo.node(source_idx),
                destination: self.topo.node(dest_idx),
                bandwidth,
            };

            let provisioning = heuristic.provision(&self.topo, &self.state, &mut self.scratchpad, &request);
            stats.count_provisioning(&provisioning);

            if provisioning.state == ProvisioningState::Success {
                self.state.provision(&provisioning);
                let holding: u64 = draw_exp(&mut rng, AVG_INTARRIVAL * load);
                let expiry = current_time + holding;
                active.entry(expiry).or_default().push(ActiveConnection { provisioning });
            }

            events_since_check += 1;
            self.maybe_sanity_check(&active, &mut events_since_check);

            next_request_time = current_time + draw_exp(&mut rng, AVG_INTARRIVAL);
        }

        stats
    }

    fn maybe_sanity_check(&self, active: &BTreeMap<u64, Vec<ActiveConnection>>, counter: &mut u64) {
        if *counter < SANITY_CHECK_INTERVAL {
            return;
        }
        *counter = 0;
        if cfg!(debug_assertions) {
            let flat: Vec<Provisioning> =
                active.values().flatten().map(|c| c.provisioning.clone()).collect();
            self.state.sanity_check(&flat);
        }
    }
}

fn param_u64(params: &ParameterSet, name: &str, default: u64) -> u64 {
    params.get(name).copied().unwrap_or(default as f64).max(0.0) as u64
}

fn param_f64(params: &ParameterSet, name: &str, default: f64) -> f64 {
    params.get(name).copied().unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::Job;

    fn two_node_topo() -> Topology {
        Topology::from_edges(2, vec![(0, 1, 100), (1, 0, 100)])
    }

    #[test]
    fn trivial_two_node_graph_blocks_backup() {
        let topo = two_node_topo();
        let mut sim = Simulation::new(topo, 42);
        let mut params = ParameterSet::new();
        params.insert("iters".into(), 1.0);
        params.insert("discard".into(), 0.0);
        params.insert("k".into(), 2.0);
        let job = Job { index: 0, algorithm: "ff".into(), params, param_order: Vec::new() };
        let stats = sim.run(&job);
        assert_eq!(stats.n_provisioned, 0);
        assert_eq!(stats.n_blocked, 1);
    }

    #[test]
    fn determinism_same_job_same_output() {
        let topo = two_node_topo();
        let mut params = ParameterSet::new();
        params.insert("iters".into(), 50.0);
        params.insert("discard".into(), 0.0);
        let job = Job { index: 7, algorithm: "ff".into(), params, param_order: Vec::new() };

        let mut sim1 = Simulation::new(topo.clone(), 1);
        let mut sim2 = Simulation::new(topo, 1);
        let r1 = sim1.run(&job);
        let r2 = sim2.run(&job);
        assert_eq!(r1.to_row(), r2.to_row());
    }

    #[test]
    fn discard_budget_drops_first_n_events() {
        let topo = Topology::from_edges(
            3,
            vec![(0, 1, 100), (1, 0, 100), (0, 2, 100), (2, 0, 100), (1, 2, 100), (2, 1, 100)],
        );
        let mut sim = Simulation::new(topo, 3);
        let mut params = ParameterSet::new();
        params.insert("iters".into(), 1000.0);
        params.insert("discard".into(), 500.0);
        let job = Job { index: 0, algorithm: "ff".into(), params, param_order: Vec::new() };
        let stats = sim.run(&job);
        assert_eq!(stats.n_provisioned + stats.n_blocked, 500);
    }
}
