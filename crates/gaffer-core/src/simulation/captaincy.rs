// Captaincy ranking.
//
// Each candidate gets a position-aware volatility, one Monte Carlo run, and
// is ranked by expected captain (doubled) points. Candidates are simulated in
// parallel, each on its own generator sub-stream of the call's seed.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::SimulationConfig;
use crate::player::{Player, Position};
use crate::simulation::cancel::RunLimits;
use crate::simulation::engine::{
    resolve_seed, stream_rng, SimulationEngine, SimulationError, SimulationResult,
};
use crate::simulation::volatility::VolatilityModel;

/// Fewest candidates a comparison makes sense for.
pub const MIN_CANDIDATES: usize = 2;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CaptaincyError {
    #[error("captaincy comparison needs at least 2 candidates, got {found}")]
    InsufficientCandidates { found: usize },

    #[error("simulation failed for player {player_id}: {source}")]
    Simulation {
        player_id: String,
        source: SimulationError,
    },
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// One candidate's captaincy profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptaincyReport {
    pub player_id: String,
    pub name: String,
    pub position: Position,
    pub predicted_score: f64,
    #[serde(flatten)]
    pub simulation: SimulationResult,
}

// ---------------------------------------------------------------------------
// Ranker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct CaptaincyRanker {
    volatility: VolatilityModel,
    engine: SimulationEngine,
}

impl CaptaincyRanker {
    pub fn new(config: &SimulationConfig) -> Self {
        CaptaincyRanker {
            volatility: VolatilityModel::new(&config.volatility),
            engine: SimulationEngine::new(config.thresholds),
        }
    }

    pub fn with_limits(mut self, limits: RunLimits) -> Self {
        self.engine = self.engine.with_limits(limits);
        self
    }

    /// Simulate every candidate with `n` samples and rank them by expected
    /// captain points, best first. Equal expectations keep input order.
    ///
    /// Candidate `i` samples from stream `i` of `seed`, so a fixed seed
    /// reproduces the exact ranking and statistics. `None` seeds from
    /// entropy.
    pub fn compare_captains(
        &self,
        players: &[Player],
        n: usize,
        seed: Option<u64>,
    ) -> Result<Vec<CaptaincyReport>, CaptaincyError> {
        if players.len() < MIN_CANDIDATES {
            return Err(CaptaincyError::InsufficientCandidates {
                found: players.len(),
            });
        }

        let seed = resolve_seed(seed);

        let mut reports = players
            .par_iter()
            .enumerate()
            .map(|(index, player)| self.report(player, n, seed, index as u64))
            .collect::<Result<Vec<_>, _>>()?;

        reports.sort_by(|a, b| {
            b.simulation
                .expected_captain_points
                .total_cmp(&a.simulation.expected_captain_points)
        });

        if let Some(best) = reports.first() {
            info!(
                "Captaincy: {} candidates x {} sims, best {} ({:.2} exp. captain pts)",
                reports.len(),
                n,
                best.name,
                best.simulation.expected_captain_points
            );
        }

        Ok(reports)
    }

    fn report(
        &self,
        player: &Player,
        n: usize,
        seed: u64,
        stream: u64,
    ) -> Result<CaptaincyReport, CaptaincyError> {
        let stdev = self.volatility.for_player(player);
        let mut rng = stream_rng(seed, stream);
        let simulation = self
            .engine
            .simulate(player.predicted_score, stdev, n, &mut rng)
            .map_err(|source| CaptaincyError::Simulation {
                player_id: player.id.clone(),
                source,
            })?;

        debug!(
            "captaincy sim {}: mean {:.2} stdev {:.2} -> {:.2} pts, haul {:.3}, blank {:.3}",
            player.id,
            player.predicted_score,
            simulation.stdev,
            simulation.expected_points,
            simulation.haul_probability,
            simulation.blank_probability
        );

        Ok(CaptaincyReport {
            player_id: player.id.clone(),
            name: player.name.clone(),
            position: player.position,
            predicted_score: player.predicted_score,
            simulation,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
