// src/rl/year_sampler.rs
//
// Campaign-year sampling.
//
// Candidates are the years with fully observed weather: a fixed pair of
// older years plus every year from 2020 up to two years before the current
// one. Draws come from a per-instance seeded RNG, so a fixed seed gives a
// reproducible year sequence.

use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Datelike;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Older years known to have complete weather records.
pub const FULL_WEATHER_YEARS: [i32; 2] = [2017, 2019];

/// First year of the contiguous recent range.
pub const RECENT_YEARS_START: i32 = 2020;

/// Candidate campaign years given the current calendar year.
///
/// The recent range ends two years before `current_year` (inclusive).
pub fn candidate_years(current_year: i32) -> Vec<i32> {
    FULL_WEATHER_YEARS
        .iter()
        .copied()
        .chain(RECENT_YEARS_START..current_year - 1)
        .collect()
}

/// Seed derived from the wall clock, for callers that did not supply one.
pub fn wall_clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Uniform sampler over the candidate years.
#[derive(Debug, Clone)]
pub struct YearSampler {
    candidates: Vec<i32>,
    rng: ChaCha8Rng,
}

impl YearSampler {
    /// Sampler over the candidates for today's calendar year.
    pub fn new(seed: u64) -> Self {
        Self::with_current_year(seed, chrono::Local::now().year())
    }

    pub fn with_current_year(seed: u64, current_year: i32) -> Self {
        Self {
            candidates: candidate_years(current_year),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn reseed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    /// Draw one campaign year.
    pub fn sample(&mut self) -> i32 {
        // Never empty: the fixed years are always present.
        let idx = self.rng.gen_range(0..self.candidates.len());
        self.candidates[idx]
    }

    pub fn candidates(&self) -> &[i32] {
        &self.candidates
    }
}
