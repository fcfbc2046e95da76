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

//! Single-slot producer/consumer rendezvous that fans a [`JobIterator`](crate::job::JobIterator)
//! out to a fixed pool of worker threads, each running its own [`Simulation`], and drains the
//! resulting [`StatCounter`]s back to the caller in strict job-index order.
//!
//! The rendezvous holds exactly one job and one "result ready" signal at a time: the main thread
//! publishes a job only once the previous one has been picked up, so at most `#workers + 1` jobs
//! are ever in flight. Two condition variables separate the two directions of traffic -- `cv_worker`
//! wakes a worker when a new job is published, `cv_main` wakes the main thread when a job has been
//! taken (slot free again) or a result has been pushed.

use crate::job::Job;
use crate::simulation::Simulation;
use crate::stats::StatCounter;
use crate::topology::Topology;
use log::{debug, trace};
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};

struct Slot {
    /// The job currently published, if any. A job with an empty `algorithm` is the shutdown
    /// sentinel.
    job: Option<Job>,
    results: HashMap<usize, StatCounter>,
}

struct Shared {
    slot: Mutex<Slot>,
    cv_worker: Condvar,
    cv_main: Condvar,
}

fn worker_loop(shared: Arc<Shared>, mut sim: Simulation) {
    loop {
        let job = {
            let mut slot = shared.slot.lock().unwrap();
            loop {
                if slot.job.is_some() {
                    break;
                }
                slot = shared.cv_worker.wait(slot).unwrap();
            }
            let job = slot.job.as_ref().unwrap().clone();
            if job.algorithm.is_empty() {
                // Leave the sentinel in the slot so every other worker also observes it;
                // taking it would starve the rest of the pool of the shutdown signal.
                shared.cv_worker.notify_all();
            } else {
                slot.job = None;
                shared.cv_main.notify_all();
            }
            job
        };

        if job.algorithm.is_empty() {
            trace!("worker received shutdown sentinel");
            break;
        }

        debug!("worker starting job {}", job.index);
        let stats = sim.run(&job);
        trace!("worker finished job {}", job.index);

        let mut slot = shared.slot.lock().unwrap();
        slot.results.insert(job.index, stats);
        shared.cv_main.notify_all();
    }
}

/// Runs every job produced by `jobs` across `num_threads` worker threads, invoking `on_result`
/// on the main thread once per job, strictly in ascending `index` order, as each job's result
/// becomes the next one due.
///
/// `num_threads` is clamped to at least 1. Each worker owns a fresh [`Simulation`] built from a
/// clone of `topo` and `base_seed`; the topology itself is read-only and never mutated after load.
pub fn run(
    topo: &Topology,
    base_seed: u64,
    num_threads: usize,
    jobs: impl Iterator<Item = Job>,
    mut on_result: impl FnMut(&Job, &StatCounter),
) {
    let num_threads = num_threads.max(1);
    let shared = Arc::new(Shared {
        slot: Mutex::new(Slot { job: None, results: HashMap::new() }),
        cv_worker: Condvar::new(),
        cv_main: Condvar::new(),
    });

    let handles: Vec<JoinHandle<()>> = (0..num_threads)
        .map(|_| {
            let shared = Arc::clone(&shared);
            let sim = Simulation::new(topo.clone(), base_seed);
            thread::spawn(move || worker_loop(shared, sim))
        })
        .collect();

    // `jobs` themselves are kept alongside their results so `on_result` can report the job's
    // parameters together with its statistics.
    let mut pending: HashMap<usize, Job> = HashMap::new();
    let mut jobs = jobs;
    let mut next_emit = 0usize;
    let mut next_job = jobs.next();

    loop {
        let mut slot = shared.slot.lock().unwrap();

        // Drain anything already sitting in the result map before producing more work.
        while let Some(stats) = slot.results.remove(&next_emit) {
            let job = pending.remove(&next_emit).expect("result without a pending job");
            drop(slot);
            on_result(&job, &stats);
            next_emit += 1;
            slot = shared.slot.lock().unwrap();
        }

        if next_job.is_none() && pending.is_empty() {
            // All jobs dispatched and every result drained: post the shutdown sentinel.
            slot.job = Some(Job {
                index: usize::MAX,
                algorithm: String::new(),
                params: Default::default(),
                param_order: Vec::new(),
            });
            shared.cv_worker.notify_all();
            break;
        }

        if slot.job.is_none() {
            if let Some(job) = next_job.take() {
                debug!("dispatching job {} ({})", job.index, job.algorithm);
                pending.insert(job.index, job.clone());
                slot.job = Some(job);
                next_job = jobs.next();
                shared.cv_worker.notify_all();
                continue;
            }
        }

        // Nothing to drain, nothing to produce right now: wait for a worker to free the slot or
        // push a result.
        let _slot = shared.cv_main.wait(slot).unwrap();
    }

    for handle in handles {
        handle.join().expect("worker thread panicked");
    }
}
