// Monte Carlo side: volatility, sampling, captaincy ranking and
// uncertainty bands.

pub mod cancel;
pub mod captaincy;
pub mod engine;
pub mod uncertainty;
pub mod volatility;

pub use cancel::{CancellationToken, RunLimits};
pub use captaincy::{CaptaincyError, CaptaincyRanker, CaptaincyReport};
pub use engine::{SimulationEngine, SimulationError, SimulationResult};
pub use uncertainty::{UncertaintyBand, UncertaintyEstimator, VarianceProfile};
pub use volatility::VolatilityModel;

use crate::player::Player;

/// Rank captaincy candidates with the default simulation settings.
pub fn compare_captains(
    players: &[Player],
    n_sims: usize,
    seed: Option<u64>,
) -> Result<Vec<CaptaincyReport>, CaptaincyError> {
    CaptaincyRanker::default().compare_captains(players, n_sims, seed)
}

/// Uncertainty band for one player with the default stdev heuristic.
pub fn estimate_uncertainty(
    player: &Player,
    n_sims: usize,
    seed: Option<u64>,
) -> Result<UncertaintyBand, SimulationError> {
    UncertaintyEstimator::default().estimate_uncertainty(player, n_sims, seed)
}
