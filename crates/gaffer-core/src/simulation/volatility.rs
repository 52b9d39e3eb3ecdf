// Position-aware volatility: how wide a player's points distribution is.
//
// Attacking positions get a wider floor, and attacking involvement widens it
// further. Involvement only ever adds volatility.

use crate::config::{PerPosition, VolatilityConfig};
use crate::player::{Player, Position};
use crate::simulation::engine::clamp_stdev;

#[derive(Debug, Clone, PartialEq)]
pub struct VolatilityModel {
    base_stdev: PerPosition<f64>,
    explosiveness_factor: f64,
}

impl VolatilityModel {
    pub fn new(config: &VolatilityConfig) -> Self {
        VolatilityModel {
            base_stdev: config.base_stdev,
            explosiveness_factor: config.explosiveness_factor,
        }
    }

    /// `max(base, base + factor * attacking_involvement)`, clamped to a
    /// small positive floor.
    pub fn stdev_for(&self, position: Position, attacking_involvement: f64) -> f64 {
        let base = self.base_stdev.get(position);
        let explosiveness = self.explosiveness_factor * attacking_involvement;
        // f64::max ignores a NaN operand, so junk involvement falls back to base.
        clamp_stdev(base.max(base + explosiveness))
    }

    pub fn for_player(&self, player: &Player) -> f64 {
        self.stdev_for(player.position, player.attacking_involvement)
    }
}

impl Default for VolatilityModel {
    fn default() -> Self {
        Self::new(&VolatilityConfig::default())
    }
}
