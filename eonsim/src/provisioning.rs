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

//! Request/Provisioning data model and the provisioning-scheme plug-in contract.

use crate::modulation::Modulation;
use crate::network_state::NetworkState;
use crate::scratchpad::Scratchpad;
use crate::topology::{LinkDescriptor, Topology};
use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;

/// A connection request: `(source, destination, bandwidth)`, bandwidth already expressed in
/// slot-equivalent units. `source != destination` is an invariant established by the caller
/// (the simulation loop), not re-checked here.
#[derive(Debug, Clone, Copy)]
pub struct Request {
    /// Source node.
    pub source: crate::topology::NodeId,
    /// Destination node.
    pub destination: crate::topology::NodeId,
    /// Requested bandwidth, in slot-equivalent units.
    pub bandwidth: u32,
}

/// Outcome of a single provisioning attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningState {
    /// Primary and backup were both successfully allocated.
    Success,
    /// No loopless path exists at all for the primary.
    BlockPriNoPath,
    /// A primary path exists but no feasible modulation/slot window was found.
    BlockPriNoSpec,
    /// A primary was allocated but no link-disjoint backup path exists.
    BlockSecNoPath,
    /// A link-disjoint backup path exists but no feasible modulation/slot window was found.
    BlockSecNoSpec,
}

/// The full record of one provisioning attempt, successful or not.
#[derive(Debug, Clone)]
pub struct Provisioning {
    /// Primary path (empty if no path was ever found).
    pub pri_path: Vec<LinkDescriptor>,
    /// Half-open primary slot range.
    pub pri_spec_begin: usize,
    /// See [`Provisioning::pri_spec_begin`].
    pub pri_spec_end: usize,
    /// Modulation used by the primary.
    pub pri_mod: Modulation,
    /// Backup path (empty if no path was ever found).
    pub bkp_path: Vec<LinkDescriptor>,
    /// Half-open backup slot range.
    pub bkp_spec_begin: usize,
    /// See [`Provisioning::bkp_spec_begin`].
    pub bkp_spec_end: usize,
    /// Modulation used by the backup.
    pub bkp_mod: Modulation,
    /// The original requested bandwidth.
    pub bandwidth: u32,
    /// Outcome of the attempt.
    pub state: ProvisioningState,
}

impl Provisioning {
    /// A blocked provisioning carrying no paths or slots, for the given reason.
    pub fn blocked(bandwidth: u32, state: ProvisioningState) -> Self {
        debug_assert!(state != ProvisioningState::Success);
        Self {
            pri_path: Vec::new(),
            pri_spec_begin: 0,
            pri_spec_end: 0,
            pri_mod: Modulation::None,
            bkp_path: Vec::new(),
            bkp_spec_begin: 0,
            bkp_spec_end: 0,
            bkp_mod: Modulation::None,
            bandwidth,
            state,
        }
    }
}

/// Named, numeric heuristic parameters (e.g. `k_pri`, `c_cut`): a flat string-keyed map of
/// `f64`s, validated and defaulted by each scheme individually.
pub type ParameterSet = HashMap<String, f64>;

/// Reads a named parameter from `params`, falling back to `default` when absent.
pub fn param_or(params: &ParameterSet, name: &str, default: f64) -> f64 {
    params.get(name).copied().unwrap_or(default)
}

/// A pluggable routing-and-spectrum-assignment heuristic.
///
/// Implementations must never mutate `state`, and must leave `scratchpad`'s weight arrays
/// restored to the topology's native lengths on return -- the simulation loop does not reset
/// them between calls.
pub trait ProvisioningScheme: fmt::Display + Send {
    /// Computes a (possibly blocked) provisioning for `request`.
    fn provision(
        &mut self,
        topo: &Topology,
        state: &NetworkState,
        scratchpad: &mut Scratchpad,
        request: &Request,
    ) -> Provisioning;

    /// A short listing of this scheme's recognised parameter names and defaults, for `--help`.
    /// Empty by default; schemes with tunable parameters override it.
    fn param_help(&self) -> &'static str {
        ""
    }
}

type Factory = fn(&ParameterSet) -> Box<dyn ProvisioningScheme>;

/// Process-wide name -> factory registry for provisioning schemes.
///
/// Populated once, lazily, on first use (via [`lazy_static`]) rather than relying on
/// global-initialization order across translation units, per the registration guidance in the
/// design notes.
pub struct Registry {
    factories: Mutex<HashMap<&'static str, Factory>>,
}

impl Registry {
    fn new() -> Self {
        Self { factories: Mutex::new(HashMap::new()) }
    }

    /// Registers `factory` under `name`. Re-registering the same name overwrites the previous
    /// factory silently, mirroring a simple self-registering-template idiom.
    pub fn register(&self, name: &'static str, factory: Factory) {
        self.factories.lock().unwrap().insert(name, factory);
    }

    /// Instantiates the scheme registered as `name`, or `None` if unknown.
    pub fn create(&self, name: &str, params: &ParameterSet) -> Option<Box<dyn ProvisioningScheme>> {
        let factories = self.factories.lock().unwrap();
        factories.get(name).map(|f| f(params))
    }

    /// Every registered name, for `--help`-style listings.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.lock().unwrap().keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// True if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.lock().unwrap().contains_key(name)
    }
}

lazy_static::lazy_static! {
    /// The process-wide provisioning-scheme registry, populated by
    /// [`crate::schemes::register_all`] on first use.
    pub static ref REGISTRY: Registry = {
        let r = Registry::new();
        crate::schemes::register_all(&r);
        r
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_knows_every_builtin_scheme() {
        for name in &["ff", "mfsb", "pfmbl", "ksq", "shortestfflf"] {
            assert!(REGISTRY.contains(name), "missing scheme `{}`", name);
        }
    }

    #[test]
    fn unknown_scheme_is_none() {
        assert!(REGISTRY.create("nonexistent", &ParameterSet::new()).is_none());
    }
}
