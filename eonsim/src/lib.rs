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

//! Discrete-event Monte-Carlo simulator for Shared Path Protection (SPP) in Elastic Optical
//! Networks (EONs).
//!
//! The crate is organised leaves-first, mirroring the data flow of a run: an immutable
//! [`topology`] is shared read-only by every worker; each worker owns a [`scratchpad`] and
//! [`network_state`] and runs [`pathsearch`] (Dijkstra/Yen) on behalf of a pluggable
//! [`provisioning scheme`](provisioning::ProvisioningScheme) from [`schemes`]; [`simulation`]
//! drives the event loop and reports into a [`stats::StatCounter`]; [`job`] parses the parameter
//! sweep grammar and walks the resulting Cartesian product of jobs.

pub mod bitset;
pub mod error;
pub mod job;
pub mod modulation;
pub mod network_state;
pub mod pathsearch;
pub mod provisioning;
pub mod schemes;
pub mod scratchpad;
pub mod simulation;
pub mod stats;
pub mod topology;
pub mod worker_pool;

pub use error::{Error, Result};
