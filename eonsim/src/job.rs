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

//! Parameter-sweep grammar parser and Cartesian job iterator.
//!
//! Parses the two grammar instances of the command-line interface
//! (`--opts` global ranges, `--algs` per-algorithm ranges) and exposes a [`JobIterator`] that
//! walks the resulting Cartesian product in the documented order: algorithms in reverse of
//! parsing order, parameters cycling odometer-style (first parameter fastest) within each
//! algorithm.

use crate::error::{Error, Result};
use crate::provisioning::ParameterSet;
use std::collections::BTreeMap;

/// A numeric range `min:step:max` (or the degenerate `v` == `v:1:v`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    /// Inclusive minimum.
    pub min: f64,
    /// Step between successive values.
    pub step: f64,
    /// Inclusive maximum.
    pub max: f64,
}

impl Range {
    fn degenerate(v: f64) -> Self {
        Self { min: v, step: 1.0, max: v }
    }

    /// Number of distinct values this range produces: `1 + floor((max - min) / step)`.
    pub fn count(&self) -> usize {
        if self.step <= 0.0 || self.max < self.min {
            return 0;
        }
        1 + ((self.max - self.min) / self.step).floor() as usize
    }

    /// The `i`-th value of the range (0-based).
    pub fn value_at(&self, i: usize) -> f64 {
        self.min + self.step * i as f64
    }
}

/// One `name(opt=range,...)` entry from the `--algs` grammar, or a bare global option.
#[derive(Debug, Clone)]
pub struct AlgEntry {
    /// Algorithm name (or, for global options, unused).
    pub name: String,
    /// Parsed per-option ranges, in the order they were written.
    pub opts: Vec<(String, Range)>,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

struct Parser<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, chars: input.chars().collect(), pos: 0 }
    }

    fn err(&self, reason: impl Into<String>) -> Error {
        let column = self.pos;
        Error::ParamSyntax {
            column,
            reason: reason.into(),
            input: self.input.to_string(),
            caret: format!("{}^", " ".repeat(column)),
        }
    }

    fn skip_ws(&mut self) {
        while self.pos < self.chars.len() && self.chars[self.pos].is_whitespace() {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, c: char) -> Result<()> {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.err(format!("expected `{}`", c)))
        }
    }

    fn parse_identifier(&mut self) -> Result<String> {
        self.skip_ws();
        let start = self.pos;
        while self.peek().map(is_ident_char).unwrap_or(false) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.err("expected an identifier"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_number(&mut self) -> Result<f64> {
        self.skip_ws();
        let start = self.pos;
        if self.peek() == Some('-') {
            self.pos += 1;
        }
        while self.peek().map(|c| c.is_ascii_digit() || c == '.').unwrap_or(false) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.err("expected a number"));
        }
        self.chars[start..self.pos].iter().collect::<String>().parse().map_err(|_| self.err("invalid number"))
    }

    fn parse_range(&mut self) -> Result<Range> {
        let first = self.parse_number()?;
        self.skip_ws();
        if self.peek() != Some(':') {
            return Ok(Range::degenerate(first));
        }
        self.pos += 1;
        let step = self.parse_number()?;
        self.eat(':')?;
        let max = self.parse_number()?;
        Ok(Range { min: first, step, max })
    }

    fn parse_param(&mut self) -> Result<(String, Range)> {
        let name = self.parse_identifier()?;
        self.eat('=')?;
        let range = self.parse_range()?;
        Ok((name, range))
    }

    /// Parses a comma-separated `name=range` list (the `--opts` grammar).
    fn parse_opts(&mut self) -> Result<Vec<(String, Range)>> {
        self.skip_ws();
        if self.pos >= self.chars.len() {
            return Ok(Vec::new());
        }
        let mut opts = Vec::new();
        loop {
            opts.push(self.parse_param()?);
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                }
                None => break,
                Some(other) => return Err(self.err(format!("unexpected `{}`", other))),
            }
        }
        Ok(opts)
    }

    /// Parses a comma-separated `entry (',' entry)*` list (the `--algs` grammar).
    fn parse_algs(&mut self) -> Result<Vec<AlgEntry>> {
        self.skip_ws();
        if self.pos >= self.chars.len() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        loop {
            let name = self.parse_identifier()?;
            self.skip_ws();
            let opts = if self.peek() == Some('(') {
                self.pos += 1;
                let opts = self.parse_opts()?;
                self.eat(')')?;
                opts
            } else {
                Vec::new()
            };
            entries.push(AlgEntry { name, opts });
            self.skip_ws();
            match self.peek() {
                Some(',') => {
                    self.pos += 1;
                }
                None => break,
                Some(other) => return Err(self.err(format!("unexpected `{}`", other))),
            }
        }
        Ok(entries)
    }
}

/// Parses the `--opts` global-option grammar: comma-separated `name=range` pairs.
pub fn parse_global_opts(input: &str) -> Result<Vec<(String, Range)>> {
    Parser::new(input).parse_opts()
}

/// Parses the `--algs` grammar: comma-separated `name(opt=range,...)` entries.
pub fn parse_algs(input: &str) -> Result<Vec<AlgEntry>> {
    Parser::new(input).parse_algs()
}

/// Default global options applied before parsing overrides them.
pub fn default_globals() -> Vec<(String, Range)> {
    vec![
        ("iters".into(), Range::degenerate(100_000.0)),
        ("discard".into(), Range::degenerate(10_000.0)),
        ("k".into(), Range::degenerate(4.0)),
        ("load".into(), Range { min: 150.0, step: 10.0, max: 210.0 }),
        ("bwmin".into(), Range::degenerate(10.0)),
        ("bwmax".into(), Range::degenerate(400.0)),
    ]
}

/// One fully-resolved job: a concrete parameter binding for a named algorithm, plus the index
/// that fixes its place in the output order.
#[derive(Debug, Clone)]
pub struct Job {
    /// Position of this job in the overall sweep; fixes output ordering.
    pub index: usize,
    /// Registered provisioning-scheme name.
    pub algorithm: String,
    /// Concrete parameter bindings for this job.
    pub params: ParameterSet,
    /// Parameter names in the order they should be rendered in the output table (algorithm-local
    /// options first in parse order, then merged-in global options) -- `params` itself is a
    /// `HashMap` and so carries no ordering of its own.
    pub param_order: Vec<String>,
}

struct ResolvedAlg {
    name: String,
    /// Merged options in a stable order: algorithm-local options first (in parse order), then
    /// any global options not overridden locally.
    ranges: Vec<(String, Range)>,
}

impl ResolvedAlg {
    fn total(&self) -> usize {
        self.ranges.iter().map(|(_, r)| r.count()).product()
    }

    /// Odometer-style lookup: the first option cycles fastest.
    fn params_at(&self, mut i: usize) -> ParameterSet {
        let mut params = ParameterSet::new();
        for (name, range) in &self.ranges {
            let count = range.count().max(1);
            let idx = i % count;
            i /= count;
            params.insert(name.clone(), range.value_at(idx));
        }
        params
    }
}

/// Walks the full Cartesian product of algorithms x parameter ranges, in the order specified:
/// algorithms in reverse of parsing order, parameters odometer-style within an algorithm.
pub struct JobIterator {
    algs: Vec<ResolvedAlg>,
    /// Cumulative job count at the start of each algorithm, for `O(log n)` index lookup.
    prefix: Vec<usize>,
    total: usize,
    next_index: usize,
}

impl JobIterator {
    /// Builds the sweep from the raw `--opts`/`--algs` strings.
    pub fn parse(opts: &str, algs: &str) -> Result<Self> {
        let mut globals: BTreeMap<String, Range> = default_globals().into_iter().collect();
        for (name, range) in parse_global_opts(opts)? {
            validate_range(&name, &range)?;
            globals.insert(name, range);
        }

        let entries = parse_algs(algs)?;
        let mut resolved = Vec::new();
        for entry in &entries {
            let mut ranges: Vec<(String, Range)> = Vec::new();
            let mut seen: std::collections::HashSet<String> = std::collections::HashSet::new();
            for (name, range) in &entry.opts {
                validate_range(name, range)?;
                ranges.push((name.clone(), *range));
                seen.insert(name.clone());
            }
            for (name, range) in &globals {
                if !seen.contains(name) {
                    ranges.push((name.clone(), *range));
                }
            }
            resolved.push(ResolvedAlg { name: entry.name.clone(), ranges });
        }
        // Iteration order: algorithms in reverse of parsing order.
        resolved.reverse();

        let mut prefix = Vec::with_capacity(resolved.len());
        let mut total = 0;
        for alg in &resolved {
            prefix.push(total);
            total += alg.total();
        }

        Ok(Self { algs: resolved, prefix, total, next_index: 0 })
    }

    /// Total number of jobs in the sweep.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Skips ahead by `n` jobs (used to implement `--skip`).
    pub fn skip(&mut self, n: usize) -> Result<()> {
        if n >= self.total && self.total > 0 {
            return Err(Error::SkipBeyondTotal { skip: n, total: self.total });
        }
        self.next_index = n;
        Ok(())
    }
}

impl Iterator for JobIterator {
    type Item = Job;

    fn next(&mut self) -> Option<Job> {
        if self.next_index >= self.total {
            return None;
        }
        let idx = self.next_index;
        self.next_index += 1;

        // Find which algorithm this global index falls into.
        let alg_pos = match self.prefix.binary_search(&idx) {
            Ok(p) => p,
            Err(p) => p - 1,
        };
        let alg = &self.algs[alg_pos];
        let local_idx = idx - self.prefix[alg_pos];
        let params = alg.params_at(local_idx);
        let param_order = alg.ranges.iter().map(|(name, _)| name.clone()).collect();

        Some(Job { index: idx, algorithm: alg.name.clone(), params, param_order })
    }
}

fn validate_range(name: &str, range: &Range) -> Result<()> {
    if range.max < range.min || (range.step <= 0.0 && range.max != range.min) {
        return Err(Error::InvalidRange { name: name.to_string(), min: range.min, step: range.step, max: range.max });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_degenerate_and_full_ranges() {
        let opts = parse_global_opts("load=150:10:210,bwmin=10").unwrap();
        assert_eq!(opts[0].1, Range { min: 150.0, step: 10.0, max: 210.0 });
        assert_eq!(opts[1].1, Range::degenerate(10.0));
    }

    #[test]
    fn parses_algorithm_list_with_nested_opts() {
        let algs = parse_algs("ff(k=2),mfsb(k_pri=2,k_bkp=3)").unwrap();
        assert_eq!(algs.len(), 2);
        assert_eq!(algs[0].name, "ff");
        assert_eq!(algs[1].opts.len(), 2);
    }

    #[test]
    fn rejects_malformed_input_with_column() {
        let err = parse_algs("ff(k=)").unwrap_err();
        match err {
            Error::ParamSyntax { column, .. } => assert_eq!(column, 5),
            _ => panic!("expected ParamSyntax"),
        }
    }

    #[test]
    fn odometer_cycles_first_param_fastest() {
        let mut iter = JobIterator::parse("iters=1,discard=0,k=1,load=1,bwmin=1,bwmax=1", "x(a=1:1:2,b=1:1:2)").unwrap();
        let jobs: Vec<_> = iter.by_ref().collect();
        assert_eq!(jobs.len(), 4);
        assert_eq!(jobs[0].params["a"], 1.0);
        assert_eq!(jobs[0].params["b"], 1.0);
        assert_eq!(jobs[1].params["a"], 2.0);
        assert_eq!(jobs[1].params["b"], 1.0);
        assert_eq!(jobs[2].params["a"], 1.0);
        assert_eq!(jobs[2].params["b"], 2.0);
    }

    #[test]
    fn algorithms_iterate_in_reverse_of_parsing_order() {
        let iter = JobIterator::parse(
            "iters=1,discard=0,k=1,load=1,bwmin=1,bwmax=1",
            "first(a=1),second(a=1)",
        )
        .unwrap();
        let jobs: Vec<_> = iter.collect();
        assert_eq!(jobs[0].algorithm, "second");
        assert_eq!(jobs[1].algorithm, "first");
    }

    #[test]
    fn output_indices_strictly_increase() {
        let iter = JobIterator::parse(
            "iters=1,discard=0,k=1,load=1,bwmin=1,bwmax=1",
            "a(x=1:1:3),b(x=1:1:2)",
        )
        .unwrap();
        let jobs: Vec<_> = iter.collect();
        for w in jobs.windows(2) {
            assert!(w[1].index > w[0].index);
        }
    }

    #[test]
    fn skip_beyond_total_is_an_error() {
        let mut iter = JobIterator::parse("iters=1,discard=0,k=1,load=1,bwmin=1,bwmax=1", "a(x=1)").unwrap();
        assert!(iter.skip(1).is_err());
    }
}
