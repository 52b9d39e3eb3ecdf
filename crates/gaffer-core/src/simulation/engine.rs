// Monte Carlo sampling of fantasy points.
//
// Points are drawn from a normal distribution around the prediction and
// clipped at zero, since a player cannot score negative fantasy points.
// The generator is always injected: callers choose between a fixed seed
// (reproducible) and an entropy-seeded one.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;
use tracing::debug;

use crate::config::OutcomeThresholds;
use crate::simulation::cancel::RunLimits;

/// Smallest standard deviation ever handed to the sampler.
pub const MIN_STDEV: f64 = 1e-6;

/// Samples drawn between cancellation/deadline checks.
const CHECK_INTERVAL: usize = 1024;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SimulationError {
    #[error("sample count must be greater than 0")]
    NoSamples,

    #[error("cannot sample from normal(mean = {mean}, stdev = {stdev})")]
    InvalidDistribution { mean: f64, stdev: f64 },

    #[error("simulation cancelled after {completed} of {requested} samples")]
    Cancelled { completed: usize, requested: usize },

    #[error("simulation deadline exceeded after {completed} of {requested} samples")]
    DeadlineExceeded { completed: usize, requested: usize },
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Resolve an optional seed: `None` draws a fresh one from the thread RNG.
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| rand::thread_rng().gen())
}

/// Independent sub-stream `stream` of the generator seeded with `seed`.
///
/// Parallel workers each take their own stream, so results depend only on
/// the seed and the worker's index, never on scheduling.
pub fn stream_rng(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

/// Replace a zero, negative or NaN stdev with [`MIN_STDEV`].
pub fn clamp_stdev(stdev: f64) -> f64 {
    if stdev > MIN_STDEV {
        stdev
    } else {
        if stdev != MIN_STDEV {
            debug!("degenerate stdev {} clamped to {}", stdev, MIN_STDEV);
        }
        MIN_STDEV
    }
}

// ---------------------------------------------------------------------------
// SimulationResult
// ---------------------------------------------------------------------------

/// Outcome statistics for one simulated player.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    /// Mean of the sampling distribution (the point prediction).
    pub mean: f64,
    /// Standard deviation actually used, after clamping.
    pub stdev: f64,
    /// Mean of the clipped samples.
    pub expected_points: f64,
    /// Mean of the doubled clipped samples (captain scoring).
    pub expected_captain_points: f64,
    /// Fraction of samples at or above the haul threshold.
    pub haul_probability: f64,
    /// Fraction of samples at or below the blank threshold.
    pub blank_probability: f64,
    /// The clipped samples themselves, in draw order.
    #[serde(skip_serializing)]
    pub samples: Vec<f64>,
}

impl SimulationResult {
    /// Summarize an already-clipped, non-empty sample set.
    fn from_samples(mean: f64, stdev: f64, samples: Vec<f64>, thresholds: &OutcomeThresholds) -> Self {
        let n = samples.len() as f64;
        let total: f64 = samples.iter().sum();
        let captain_total: f64 = samples.iter().map(|s| 2.0 * s).sum();
        let hauls = samples.iter().filter(|&&s| s >= thresholds.haul).count();
        let blanks = samples.iter().filter(|&&s| s <= thresholds.blank).count();

        SimulationResult {
            mean,
            stdev,
            expected_points: total / n,
            expected_captain_points: captain_total / n,
            haul_probability: hauls as f64 / n,
            blank_probability: blanks as f64 / n,
            samples,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Clipped-normal sampler plus the haul/blank policy used to summarize it.
#[derive(Debug, Clone, Default)]
pub struct SimulationEngine {
    thresholds: OutcomeThresholds,
    limits: RunLimits,
}

impl SimulationEngine {
    pub fn new(thresholds: OutcomeThresholds) -> Self {
        SimulationEngine {
            thresholds,
            limits: RunLimits::unbounded(),
        }
    }

    /// Attach a cancellation token and/or deadline to every sampling loop.
    pub fn with_limits(mut self, limits: RunLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn thresholds(&self) -> &OutcomeThresholds {
        &self.thresholds
    }

    /// Draw `n` samples from `normal(mean, stdev)`, each clipped to `>= 0`.
    ///
    /// A degenerate stdev is clamped to [`MIN_STDEV`] rather than rejected.
    /// Errors on `n == 0`, a non-finite mean or stdev, and when the run
    /// limits trip mid-loop.
    pub fn sample<R: Rng + ?Sized>(
        &self,
        mean: f64,
        stdev: f64,
        n: usize,
        rng: &mut R,
    ) -> Result<Vec<f64>, SimulationError> {
        if n == 0 {
            return Err(SimulationError::NoSamples);
        }
        let stdev = clamp_stdev(stdev);
        if !mean.is_finite() || !stdev.is_finite() {
            return Err(SimulationError::InvalidDistribution { mean, stdev });
        }
        let normal =
            Normal::new(mean, stdev).map_err(|_| SimulationError::InvalidDistribution { mean, stdev })?;

        let mut samples = Vec::with_capacity(n);
        for i in 0..n {
            if i % CHECK_INTERVAL == 0 {
                self.limits.check(i, n)?;
            }
            samples.push(normal.sample(rng).max(0.0));
        }
        Ok(samples)
    }

    /// Simulate a player's points and derive expected value, captain
    /// expectation and haul/blank probabilities from one sample set.
    pub fn simulate<R: Rng + ?Sized>(
        &self,
        mean: f64,
        stdev: f64,
        n: usize,
        rng: &mut R,
    ) -> Result<SimulationResult, SimulationError> {
        let stdev = clamp_stdev(stdev);
        let samples = self.sample(mean, stdev, n, rng)?;
        Ok(SimulationResult::from_samples(mean, stdev, samples, &self.thresholds))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::cancel::CancellationToken;

    fn engine() -> SimulationEngine {
        SimulationEngine::default()
    }

    #[test]
    fn samples_are_never_negative() {
        let mut rng = stream_rng(7, 0);
        let samples = engine().sample(-5.0, 2.0, 10_000, &mut rng).unwrap();
        assert_eq!(samples.len(), 10_000);
        assert!(samples.iter().all(|&s| s >= 0.0));
    }

    #[test]
    fn clipping_lifts_negative_mean() {
        let mut rng = stream_rng(11, 0);
        let result = engine().simulate(-5.0, 2.0, 10_000, &mut rng).unwrap();
        assert!(result.expected_points >= 0.0);
        assert!(result.expected_points > -5.0);
        assert_eq!(result.mean, -5.0);
        // Almost every draw is clipped to zero, so almost every draw blanks.
        assert!(result.blank_probability > 0.99);
        assert_eq!(result.haul_probability, 0.0);
    }

    #[test]
    fn captain_points_double_expected_points() {
        let mut rng = stream_rng(42, 0);
        let result = engine().simulate(6.0, 3.0, 10_000, &mut rng).unwrap();
        let ratio = result.expected_captain_points / (2.0 * result.expected_points);
        assert!((ratio - 1.0).abs() < 0.05, "ratio was {ratio}");
    }

    #[test]
    fn same_seed_same_result() {
        let a = engine().simulate(5.0, 2.3, 2_000, &mut stream_rng(99, 3)).unwrap();
        let b = engine().simulate(5.0, 2.3, 2_000, &mut stream_rng(99, 3)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_streams_differ() {
        let a = engine().sample(5.0, 2.3, 100, &mut stream_rng(99, 0)).unwrap();
        let b = engine().sample(5.0, 2.3, 100, &mut stream_rng(99, 1)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn expected_points_near_mean_when_clipping_is_rare() {
        let mut rng = stream_rng(5, 0);
        let result = engine().simulate(10.0, 1.0, 20_000, &mut rng).unwrap();
        assert!((result.expected_points - 10.0).abs() < 0.1);
    }

    #[test]
    fn thresholds_are_inclusive() {
        // A near-zero stdev puts every sample on the mean.
        let mut rng = stream_rng(1, 0);
        let haul = engine().simulate(12.001, 0.0, 100, &mut rng).unwrap();
        assert_eq!(haul.haul_probability, 1.0);

        let blank = engine().simulate(1.0, 0.0, 100, &mut rng).unwrap();
        assert_eq!(blank.blank_probability, 1.0);
        assert_eq!(blank.stdev, MIN_STDEV);
    }

    #[test]
    fn higher_mean_raises_haul_and_lowers_blank() {
        let mut previous: Option<SimulationResult> = None;
        for mean in [2.0, 4.0, 6.0, 8.0, 10.0] {
            let mut rng = stream_rng(2024, 0);
            let result = engine().simulate(mean, 3.0, 20_000, &mut rng).unwrap();
            if let Some(prev) = &previous {
                assert!(result.haul_probability > prev.haul_probability);
                assert!(result.blank_probability < prev.blank_probability);
            }
            previous = Some(result);
        }
    }

    #[test]
    fn custom_thresholds() {
        let engine = SimulationEngine::new(OutcomeThresholds {
            haul: 10.0,
            blank: 3.0,
        });
        let mut rng = stream_rng(3, 0);
        let result = engine.simulate(10.001, 0.0, 50, &mut rng).unwrap();
        assert_eq!(result.haul_probability, 1.0);
        assert_eq!(result.blank_probability, 0.0);
    }

    #[test]
    fn zero_samples_is_error() {
        let mut rng = stream_rng(0, 0);
        assert_eq!(
            engine().simulate(5.0, 2.0, 0, &mut rng),
            Err(SimulationError::NoSamples)
        );
    }

    #[test]
    fn non_finite_mean_is_error() {
        let mut rng = stream_rng(0, 0);
        assert!(matches!(
            engine().simulate(f64::NAN, 2.0, 10, &mut rng),
            Err(SimulationError::InvalidDistribution { .. })
        ));
        assert!(matches!(
            engine().simulate(5.0, f64::INFINITY, 10, &mut rng),
            Err(SimulationError::InvalidDistribution { .. })
        ));
    }

    #[test]
    fn cancelled_run_stops_early() {
        let token = CancellationToken::new();
        token.cancel();
        let engine = engine().with_limits(RunLimits::unbounded().with_token(token));
        let mut rng = stream_rng(0, 0);
        assert_eq!(
            engine.sample(5.0, 2.0, 5_000, &mut rng),
            Err(SimulationError::Cancelled {
                completed: 0,
                requested: 5_000
            })
        );
    }

    #[test]
    fn stdev_clamp() {
        assert_eq!(clamp_stdev(0.0), MIN_STDEV);
        assert_eq!(clamp_stdev(-2.0), MIN_STDEV);
        assert_eq!(clamp_stdev(f64::NAN), MIN_STDEV);
        assert_eq!(clamp_stdev(2.5), 2.5);
    }

    #[test]
    fn samples_are_not_serialized() {
        let mut rng = stream_rng(8, 0);
        let result = engine().simulate(5.0, 2.0, 10, &mut rng).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("samples").is_none());
        assert!(json.get("expected_captain_points").is_some());
    }
}
