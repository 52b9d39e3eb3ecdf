// Uncertainty bands: 10th/50th/90th percentiles of a player's simulated
// points, plus a coarse stable/volatile reading of the band's width.
//
// The stdev heuristic here is position-agnostic and proportional to the
// prediction, unlike the captaincy volatility model.

use rand::Rng;
use serde::Serialize;
use tracing::debug;

use crate::config::UncertaintyConfig;
use crate::player::{Player, Position};
use crate::simulation::cancel::RunLimits;
use crate::simulation::engine::{resolve_seed, stream_rng, SimulationEngine, SimulationError};

// ---------------------------------------------------------------------------
// Band
// ---------------------------------------------------------------------------

/// Empirical percentiles of a clipped points distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UncertaintyBand {
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
}

impl UncertaintyBand {
    /// Width of the 10-90 band.
    pub fn spread(&self) -> f64 {
        self.p90 - self.p10
    }
}

/// Linear-interpolated percentile of an ascending-sorted slice, `p` in
/// `[0, 100]`. Returns 0.0 for an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        len => {
            let rank = (p / 100.0).clamp(0.0, 1.0) * (len - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            let frac = rank - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

// ---------------------------------------------------------------------------
// Estimator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct UncertaintyEstimator {
    config: UncertaintyConfig,
    engine: SimulationEngine,
}

impl UncertaintyEstimator {
    pub fn new(config: UncertaintyConfig) -> Self {
        UncertaintyEstimator {
            config,
            engine: SimulationEngine::default(),
        }
    }

    pub fn with_limits(mut self, limits: RunLimits) -> Self {
        self.engine = self.engine.with_limits(limits);
        self
    }

    /// `max(min_stdev, relative_stdev * mean)`.
    pub fn stdev_for_mean(&self, mean: f64) -> f64 {
        self.config.min_stdev.max(self.config.relative_stdev * mean)
    }

    /// Sample `n` clipped points around `mean` and report the band.
    pub fn estimate<R: Rng + ?Sized>(
        &self,
        mean: f64,
        n: usize,
        rng: &mut R,
    ) -> Result<UncertaintyBand, SimulationError> {
        let stdev = self.stdev_for_mean(mean);
        let mut samples = self.engine.sample(mean, stdev, n, rng)?;
        samples.sort_by(f64::total_cmp);

        let band = UncertaintyBand {
            p10: percentile(&samples, 10.0),
            p50: percentile(&samples, 50.0),
            p90: percentile(&samples, 90.0),
        };
        debug!(
            "uncertainty: mean {:.2} stdev {:.2} -> p10 {:.2} p50 {:.2} p90 {:.2}",
            mean, stdev, band.p10, band.p50, band.p90
        );
        Ok(band)
    }

    /// Band for one player's predicted score. A fixed `seed` reproduces the
    /// band exactly; `None` seeds from entropy.
    pub fn estimate_uncertainty(
        &self,
        player: &Player,
        n: usize,
        seed: Option<u64>,
    ) -> Result<UncertaintyBand, SimulationError> {
        let mut rng = stream_rng(resolve_seed(seed), 0);
        self.estimate(player.predicted_score, n, &mut rng)
    }
}

// ---------------------------------------------------------------------------
// Variance profile
// ---------------------------------------------------------------------------

/// Stable vs volatile reading of a band, relative to a per-position spread
/// threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VarianceProfile {
    pub position: Position,
    pub spread: f64,
    pub volatile: bool,
}

impl VarianceProfile {
    pub fn classify(position: Position, band: &UncertaintyBand) -> Self {
        let spread = band.spread();
        VarianceProfile {
            position,
            spread,
            volatile: spread >= Self::threshold(position),
        }
    }

    /// Spread at or above which a player of this position reads as volatile.
    pub fn threshold(position: Position) -> f64 {
        match position {
            Position::GK => 5.0,
            Position::DEF => 6.0,
            Position::MID => 7.0,
            Position::FWD => 8.0,
        }
    }

    pub fn description(&self) -> &'static str {
        match (self.position, self.volatile) {
            (Position::GK, false) => "Steady goalkeeper: clean sheet odds set a dependable floor.",
            (Position::GK, true) => "Swingy goalkeeper: saves and bonus points add volatility.",
            (Position::DEF, false) => "Steady defender: reliable minutes, little attacking upside.",
            (Position::DEF, true) => "Attacking defender: returns on top of clean sheets widen the range.",
            (Position::MID, false) => "Steady midfielder: consistent involvement and returns.",
            (Position::MID, true) => "High-ceiling midfielder: goal involvement drives the swings.",
            (Position::FWD, false) => "Floor forward: minutes carry most of the value.",
            (Position::FWD, true) => "Explosive forward: outcome hinges on goals.",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
