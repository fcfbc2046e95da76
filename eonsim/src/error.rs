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

//! Error taxonomy for the simulator core.
//!
//! Errors are split into the classes described by the load/configuration/runtime boundary:
//! malformed input is always a distinct [`Error`] variant propagated with `?`, never a panic.
//! Invariant violations inside [`crate::network_state::NetworkState`] are a different animal
//! entirely -- they are programming-error detectors gated behind `debug_assert!` and never
//! reach this enum.

use thiserror::Error;

/// Errors that can occur while loading a topology, parsing the parameter grammar, or validating
/// a run configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// The topology matrix could not be parsed.
    #[error("malformed topology at token {token_index}: {reason}")]
    TopologyParse {
        /// Index (0-based) of the offending whitespace-separated token.
        token_index: usize,
        /// Human-readable reason.
        reason: String,
    },

    /// I/O failure while reading the topology or writing the output table.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The parameter grammar (`--opts` / `--algs`) could not be parsed.
    #[error("parameter syntax error at column {column}: {reason}\n{input}\n{caret}")]
    ParamSyntax {
        /// 0-based column of the offending character.
        column: usize,
        /// Human-readable reason.
        reason: String,
        /// The original input string, for display.
        input: String,
        /// A caret line (spaces then `^`) pointing at `column`.
        caret: String,
    },

    /// A range's `min` is greater than its `max`, or `step` is zero while `min != max`.
    #[error("invalid range {min}:{step}:{max} for parameter `{name}`")]
    InvalidRange {
        /// Parameter name the range belongs to.
        name: String,
        /// Parsed minimum.
        min: f64,
        /// Parsed step.
        step: f64,
        /// Parsed maximum.
        max: f64,
    },

    /// The job sweep has zero total iterations.
    #[error("parameter sweep produces zero jobs")]
    EmptySweep,

    /// `--skip` is greater than or equal to the total number of jobs.
    #[error("--skip {skip} is beyond the total of {total} jobs")]
    SkipBeyondTotal {
        /// Requested skip count.
        skip: usize,
        /// Total number of jobs in the sweep.
        total: usize,
    },

    /// An algorithm name appearing in `--algs` is not registered.
    ///
    /// This is only raised during up-front validation (before any worker starts); an unknown
    /// algorithm name encountered while actually running a job does not produce this error --
    /// the worker logs a warning and yields an empty [`crate::stats::StatCounter`] instead.
    #[error("unknown provisioning algorithm `{0}`")]
    UnknownAlgorithm(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
