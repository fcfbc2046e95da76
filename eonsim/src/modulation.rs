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

//! Modulation-format selection table.
//!
//! More efficient formats have shorter reach, so [`choose`] is a linear scan from most to least
//! efficient, stopping at the first format whose reach covers the path length.

/// A modulation format, ordered from most to least spectrally efficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modulation {
    /// 64-QAM, 6 bits/symbol.
    Qam64,
    /// 32-QAM, 5 bits/symbol.
    Qam32,
    /// 16-QAM, 4 bits/symbol.
    Qam16,
    /// 8-QAM, 3 bits/symbol.
    Qam8,
    /// QPSK, 2 bits/symbol.
    Qpsk,
    /// BPSK, 1 bit/symbol.
    Bpsk,
    /// No modulation format reaches this far.
    None,
}

/// Guard band width added to every allocation, in slots.
pub const GUARDBAND: u32 = 2;

struct Entry {
    modulation: Modulation,
    /// Reach, in distance units (quantized link-length units, not kilometres).
    reach: u32,
    bits_per_symbol: u32,
}

/// Table ordered by decreasing spectral efficiency == increasing reach.
const TABLE: &[Entry] = &[
    Entry { modulation: Modulation::Qam64, reach: 125, bits_per_symbol: 6 },
    Entry { modulation: Modulation::Qam32, reach: 250, bits_per_symbol: 5 },
    Entry { modulation: Modulation::Qam16, reach: 500, bits_per_symbol: 4 },
    Entry { modulation: Modulation::Qam8, reach: 1000, bits_per_symbol: 3 },
    Entry { modulation: Modulation::Qpsk, reach: 2000, bits_per_symbol: 2 },
    Entry { modulation: Modulation::Bpsk, reach: 4000, bits_per_symbol: 1 },
];

/// Per-modulation transponder energy constant used by the dynamic energy term of
/// [`crate::stats::PerfMetrics`].
pub fn energy_per_transponder(m: Modulation) -> f64 {
    match m {
        Modulation::Bpsk => 47.13,
        Modulation::Qpsk => 62.75,
        Modulation::Qam8 => 78.38,
        Modulation::Qam16 => 94.00,
        Modulation::Qam32 => 109.63,
        Modulation::Qam64 => 125.23,
        Modulation::None => 0.0,
    }
}

/// Bits carried per symbol for a given modulation. `None` carries zero.
pub fn bits_per_symbol(m: Modulation) -> u32 {
    TABLE.iter().find(|e| e.modulation == m).map(|e| e.bits_per_symbol).unwrap_or(0)
}

/// Selects the most spectrally efficient modulation whose reach covers `distance` (sum of link
/// lengths along a path, in distance units). Returns [`Modulation::None`] if no format reaches
/// that far.
pub fn choose(distance: u32) -> Modulation {
    for entry in TABLE {
        if entry.reach >= distance {
            return entry.modulation;
        }
    }
    Modulation::None
}

/// Number of spectrum slots needed to carry `bandwidth` (already expressed in slot-equivalent
/// bandwidth units) at the given modulation, including the guard band.
pub fn slots_needed(bandwidth: u32, m: Modulation) -> u32 {
    let bps = bits_per_symbol(m);
    if bps == 0 {
        return u32::MAX;
    }
    GUARDBAND + (bandwidth + bps - 1) / bps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_most_efficient_feasible() {
        assert_eq!(choose(100), Modulation::Qam64);
        assert_eq!(choose(125), Modulation::Qam64);
        assert_eq!(choose(126), Modulation::Qam32);
        assert_eq!(choose(4000), Modulation::Bpsk);
        assert_eq!(choose(4001), Modulation::None);
    }

    #[test]
    fn slots_needed_rounds_up_and_adds_guardband() {
        assert_eq!(slots_needed(12, Modulation::Qam64), GUARDBAND + 2);
        assert_eq!(slots_needed(13, Modulation::Qam64), GUARDBAND + 3);
        assert_eq!(slots_needed(1, Modulation::Bpsk), GUARDBAND + 1);
    }
}
