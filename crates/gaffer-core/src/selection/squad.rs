// Squad: the immutable lineup produced by the selector.

use std::collections::HashMap;

use serde::Serialize;

use crate::config::CapacityConfig;
use crate::player::{Player, Position};

// ---------------------------------------------------------------------------
// Completeness
// ---------------------------------------------------------------------------

/// A position whose quota the selector could not meet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnfilledQuota {
    pub position: Position,
    pub required: usize,
    pub selected: usize,
}

/// Whether the squad satisfies the full capacity policy.
///
/// Incompleteness is a result state, not an error: the caller decides
/// whether to relax the config, warn, or show the partial lineup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SquadStatus {
    Complete,
    Incomplete {
        /// Slots left empty (`target_size - len`).
        missing: usize,
        /// Positions below their quota, in quota order.
        unfilled: Vec<UnfilledQuota>,
    },
}

// ---------------------------------------------------------------------------
// Squad
// ---------------------------------------------------------------------------

/// A lineup assembled under a [`CapacityConfig`].
///
/// Players are kept in selection order. Construction computes the derived
/// totals once; there are no mutating methods.
#[derive(Debug, Clone, Serialize)]
pub struct Squad {
    players: Vec<Player>,
    target_size: usize,
    budget_cap: f64,
    total_cost: f64,
    status: SquadStatus,
}

impl Squad {
    /// Wrap selected players and compute totals and completeness against
    /// the config they were selected under.
    pub(crate) fn assemble(players: Vec<Player>, config: &CapacityConfig) -> Self {
        let target_size = config.target_size();
        let total_cost = players.iter().map(|p| p.cost).sum();

        let unfilled: Vec<UnfilledQuota> = config
            .position_quota
            .iter()
            .filter_map(|(position, required)| {
                let selected = players.iter().filter(|p| p.position == position).count();
                (selected < required).then_some(UnfilledQuota {
                    position,
                    required,
                    selected,
                })
            })
            .collect();

        let missing = target_size.saturating_sub(players.len());
        let status = if missing == 0 && unfilled.is_empty() {
            SquadStatus::Complete
        } else {
            SquadStatus::Incomplete { missing, unfilled }
        };

        Squad {
            players,
            target_size,
            budget_cap: config.budget_cap,
            total_cost,
            status,
        }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn target_size(&self) -> usize {
        self.target_size
    }

    pub fn status(&self) -> &SquadStatus {
        &self.status
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.status, SquadStatus::Complete)
    }

    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// Budget left unspent. Never meaningfully negative: the selector only
    /// accepts affordable players.
    pub fn remaining_budget(&self) -> f64 {
        self.budget_cap - self.total_cost
    }

    pub fn total_predicted_score(&self) -> f64 {
        self.players.iter().map(|p| p.predicted_score).sum()
    }

    /// Number of selected players at a position.
    pub fn count(&self, position: Position) -> usize {
        self.players.iter().filter(|p| p.position == position).count()
    }

    /// Number of selected players per team.
    pub fn team_counts(&self) -> HashMap<&str, usize> {
        let mut counts = HashMap::new();
        for p in &self.players {
            *counts.entry(p.team.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Players grouped by position in display order (goalkeeper first).
    /// Positions with no selected player are omitted. Within a group,
    /// players are ordered by predicted score, highest first.
    pub fn by_position(&self) -> Vec<(Position, Vec<&Player>)> {
        Position::ALL
            .into_iter()
            .filter_map(|position| {
                let mut group: Vec<&Player> =
                    self.players.iter().filter(|p| p.position == position).collect();
                if group.is_empty() {
                    return None;
                }
                group.sort_by(|a, b| b.predicted_score.total_cmp(&a.predicted_score));
                Some((position, group))
            })
            .collect()
    }

    /// Outfield formation string, e.g. `3-4-3` (defenders-midfielders-forwards).
    pub fn formation(&self) -> String {
        Position::ALL
            .into_iter()
            .filter(Position::is_outfield)
            .map(|pos| self.count(pos).to_string())
            .collect::<Vec<_>>()
            .join("-")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
