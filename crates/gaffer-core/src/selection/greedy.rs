// Greedy best-XI selection under budget, quota and team-cap limits.
//
// This is a heuristic for a multi-constraint knapsack: no backtracking, so an
// early accept can starve a later, better combination. Results are
// deterministic for a given pool order.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::config::CapacityConfig;
use crate::player::{Player, Position};
use crate::selection::squad::{Squad, SquadStatus};

// ---------------------------------------------------------------------------
// Builder state
// ---------------------------------------------------------------------------

/// Running state shared by both phases.
struct Selection<'a> {
    config: &'a CapacityConfig,
    /// Indexed by pool position; identity is by index, not id.
    taken: Vec<bool>,
    picked: Vec<&'a Player>,
    team_counts: HashMap<&'a str, usize>,
    spent: f64,
}

impl<'a> Selection<'a> {
    fn new(pool_len: usize, config: &'a CapacityConfig) -> Self {
        Selection {
            config,
            taken: vec![false; pool_len],
            picked: Vec::with_capacity(config.target_size()),
            team_counts: HashMap::new(),
            spent: 0.0,
        }
    }

    /// Accept the player iff their team is under the cap and they fit in
    /// the remaining budget. Returns whether the player was accepted.
    fn try_accept(&mut self, index: usize, player: &'a Player) -> bool {
        let team_count = self.team_counts.get(player.team.as_str()).copied().unwrap_or(0);
        if team_count >= self.config.max_per_team {
            return false;
        }
        if self.config.budget_cap - self.spent - player.cost < 0.0 {
            return false;
        }

        self.taken[index] = true;
        self.picked.push(player);
        self.spent += player.cost;
        *self.team_counts.entry(player.team.as_str()).or_insert(0) += 1;
        true
    }

    fn is_full(&self) -> bool {
        self.picked.len() >= self.config.target_size()
    }

    fn finish(self) -> Squad {
        let players = self.picked.into_iter().cloned().collect();
        Squad::assemble(players, self.config)
    }
}

/// Pool entries sorted by predicted score, highest first. The sort is
/// stable, so equal scores keep their original pool order.
fn ranked<'a>(entries: impl Iterator<Item = (usize, &'a Player)>) -> Vec<(usize, &'a Player)> {
    let mut sorted: Vec<(usize, &Player)> = entries.collect();
    sorted.sort_by(|(_, a), (_, b)| b.predicted_score.total_cmp(&a.predicted_score));
    sorted
}

// ---------------------------------------------------------------------------
// Public entry point
// ---------------------------------------------------------------------------

/// Select the best lineup the greedy heuristic can find.
///
/// 1. **Quota phase**: for GK, DEF, MID, FWD in that order, walk that
///    position's players by descending predicted score and accept each one
///    that passes the team-cap and budget tests, until the position's quota
///    is met. Skipped players are not revisited in this phase.
/// 2. **Flex phase**: walk the whole pool by descending predicted score,
///    skipping players already taken, applying the same tests, until the
///    squad reaches `sum(quota) + flex_slots` or the pool runs out.
///
/// Never fails: when limits make a quota unfillable the squad comes back
/// with [`SquadStatus::Incomplete`].
pub fn select_best_xi(players: &[Player], config: &CapacityConfig) -> Squad {
    let mut selection = Selection::new(players.len(), config);

    // Phase 1: positional quotas
    for position in Position::ALL {
        let quota = config.position_quota.get(position);
        if quota == 0 {
            continue;
        }

        let candidates = ranked(
            players
                .iter()
                .enumerate()
                .filter(|(_, p)| p.position == position),
        );

        let mut filled = 0;
        for (index, player) in candidates {
            if selection.try_accept(index, player) {
                filled += 1;
                if filled == quota {
                    break;
                }
            }
        }

        if filled < quota {
            warn!(
                "quota for {} unfilled: {} of {} within budget/team limits",
                position, filled, quota
            );
        }
    }

    // Phase 2: flex slots from the whole pool
    for (index, player) in ranked(players.iter().enumerate()) {
        if selection.is_full() {
            break;
        }
        if selection.taken[index] {
            continue;
        }
        selection.try_accept(index, player);
    }

    let squad = selection.finish();

    match squad.status() {
        SquadStatus::Complete => info!(
            "Selected complete squad: {} players, cost {:.1}/{:.1}, formation {}",
            squad.len(),
            squad.total_cost(),
            config.budget_cap,
            squad.formation()
        ),
        SquadStatus::Incomplete { missing, unfilled } => warn!(
            "Selected incomplete squad: {} of {} players ({} missing, {} quota shortfalls)",
            squad.len(),
            squad.target_size(),
            missing,
            unfilled.len()
        ),
    }

    squad
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PerPosition;

    fn p(id: &str, team: &str, position: Position, cost: f64, score: f64) -> Player {
        Player::new(id, team, position, cost, score)
    }

    fn gk_only_config(budget_cap: f64) -> CapacityConfig {
        CapacityConfig {
            position_quota: PerPosition {
                gk: 1,
                def: 0,
                mid: 0,
                fwd: 0,
            },
            flex_slots: 0,
            budget_cap,
            max_per_team: 3,
        }
    }

    fn ids(squad: &Squad) -> Vec<&str> {
        squad.players().iter().map(|p| p.id.as_str()).collect()
    }

    /// A deep pool: 4 GK, 8 DEF, 8 MID, 6 FWD spread across 10 teams,
    /// all cheap enough that the default budget is never binding.
    fn deep_pool() -> Vec<Player> {
        let mut pool = Vec::new();
        let counts = [
            (Position::GK, 4),
            (Position::DEF, 8),
            (Position::MID, 8),
            (Position::FWD, 6),
        ];
        let mut n = 0;
        for (position, count) in counts {
            for i in 0..count {
                let team = format!("T{}", n % 10);
                let score = 2.0 + (i as f64) * 0.5 + (n as f64) * 0.01;
                pool.push(p(&format!("{position}{i}"), &team, position, 4.5, score));
                n += 1;
            }
        }
        pool
    }

    #[test]
    fn budget_overrides_score_ranking() {
        let pool = vec![
            p("cheap", "A", Position::GK, 4.0, 3.0),
            p("star", "B", Position::GK, 4.5, 5.0),
        ];
        let squad = select_best_xi(&pool, &gk_only_config(4.2));
        assert_eq!(ids(&squad), vec!["cheap"]);
        assert!(squad.is_complete());
    }

    #[test]
    fn deep_pool_gives_complete_legal_squad() {
        let pool = deep_pool();
        let config = CapacityConfig::default();
        let squad = select_best_xi(&pool, &config);

        assert!(squad.is_complete());
        assert_eq!(squad.len(), 11);
        assert!(squad.total_cost() <= config.budget_cap + 1e-9);
        for (_, count) in squad.team_counts() {
            assert!(count <= config.max_per_team);
        }
        for (position, quota) in config.position_quota.iter() {
            assert!(squad.count(position) >= quota);
        }
    }

    #[test]
    fn quota_phase_takes_top_scorers_per_position() {
        let pool = vec![
            p("gk1", "A", Position::GK, 4.0, 3.0),
            p("gk2", "B", Position::GK, 4.0, 4.0),
            p("def1", "C", Position::DEF, 4.0, 1.0),
            p("def2", "D", Position::DEF, 4.0, 6.0),
        ];
        let config = CapacityConfig {
            position_quota: PerPosition {
                gk: 1,
                def: 1,
                mid: 0,
                fwd: 0,
            },
            flex_slots: 0,
            budget_cap: 100.0,
            max_per_team: 3,
        };
        let squad = select_best_xi(&pool, &config);
        assert_eq!(ids(&squad), vec!["gk2", "def2"]);
    }

    #[test]
    fn flex_phase_ignores_position() {
        let pool = vec![
            p("gk1", "A", Position::GK, 4.0, 3.0),
            p("gk2", "B", Position::GK, 4.0, 9.0),
            p("mid1", "C", Position::MID, 4.0, 8.0),
            p("fwd1", "D", Position::FWD, 4.0, 7.0),
        ];
        let config = CapacityConfig {
            flex_slots: 2,
            ..gk_only_config(100.0)
        };
        let squad = select_best_xi(&pool, &config);
        // Quota takes gk2; flex takes the next best regardless of position.
        assert_eq!(ids(&squad), vec!["gk2", "mid1", "fwd1"]);
        assert!(squad.is_complete());
    }

    #[test]
    fn team_cap_skips_over_limit_players() {
        let pool = vec![
            p("a1", "A", Position::MID, 5.0, 9.0),
            p("a2", "A", Position::MID, 5.0, 8.0),
            p("a3", "A", Position::MID, 5.0, 7.0),
            p("b1", "B", Position::MID, 5.0, 6.0),
        ];
        let config = CapacityConfig {
            position_quota: PerPosition {
                gk: 0,
                def: 0,
                mid: 3,
                fwd: 0,
            },
            flex_slots: 0,
            budget_cap: 100.0,
            max_per_team: 2,
        };
        let squad = select_best_xi(&pool, &config);
        assert_eq!(ids(&squad), vec!["a1", "a2", "b1"]);
    }

    #[test]
    fn ties_keep_pool_order() {
        let pool = vec![
            p("first", "A", Position::DEF, 4.0, 5.0),
            p("second", "B", Position::DEF, 4.0, 5.0),
            p("third", "C", Position::DEF, 4.0, 5.0),
        ];
        let config = CapacityConfig {
            position_quota: PerPosition {
                gk: 0,
                def: 2,
                mid: 0,
                fwd: 0,
            },
            flex_slots: 0,
            budget_cap: 100.0,
            max_per_team: 3,
        };
        assert_eq!(ids(&select_best_xi(&pool, &config)), vec!["first", "second"]);
    }

    #[test]
    fn greedy_early_accept_can_starve_later_quota() {
        // The expensive GK is affordable on its own but leaves nothing for
        // the forward; an exact solver would take the cheap GK instead.
        let pool = vec![
            p("gk_star", "A", Position::GK, 8.0, 6.0),
            p("gk_cheap", "B", Position::GK, 4.0, 3.0),
            p("fwd", "C", Position::FWD, 5.0, 7.0),
        ];
        let config = CapacityConfig {
            position_quota: PerPosition {
                gk: 1,
                def: 0,
                mid: 0,
                fwd: 1,
            },
            flex_slots: 0,
            budget_cap: 10.0,
            max_per_team: 3,
        };
        let squad = select_best_xi(&pool, &config);
        assert_eq!(ids(&squad), vec!["gk_star"]);
        match squad.status() {
            SquadStatus::Incomplete { missing, unfilled } => {
                assert_eq!(*missing, 1);
                assert_eq!(unfilled.len(), 1);
                assert_eq!(unfilled[0].position, Position::FWD);
            }
            other => panic!("expected Incomplete, got {other:?}"),
        }
    }

    #[test]
    fn exact_budget_is_affordable() {
        let pool = vec![
            p("a", "A", Position::MID, 4.5, 3.0),
            p("b", "B", Position::MID, 5.5, 2.0),
        ];
        let config = CapacityConfig {
            position_quota: PerPosition {
                gk: 0,
                def: 0,
                mid: 2,
                fwd: 0,
            },
            flex_slots: 0,
            budget_cap: 10.0,
            max_per_team: 3,
        };
        let squad = select_best_xi(&pool, &config);
        assert!(squad.is_complete());
        assert_eq!(squad.remaining_budget(), 0.0);
    }

    #[test]
    fn rounding_overshoot_is_not_affordable() {
        // 0.1 + 0.2 lands just above 0.3, so the second pick would overspend.
        let pool = vec![
            p("a", "A", Position::MID, 0.1, 3.0),
            p("b", "B", Position::MID, 0.2, 2.0),
        ];
        let config = CapacityConfig {
            position_quota: PerPosition {
                gk: 0,
                def: 0,
                mid: 2,
                fwd: 0,
            },
            flex_slots: 0,
            budget_cap: 0.3,
            max_per_team: 3,
        };
        let squad = select_best_xi(&pool, &config);
        assert_eq!(squad.len(), 1);
        assert!(squad.total_cost() <= 0.3);
        assert!(!squad.is_complete());
    }

    #[test]
    fn empty_pool_returns_empty_incomplete_squad() {
        let squad = select_best_xi(&[], &CapacityConfig::default());
        assert!(squad.is_empty());
        match squad.status() {
            SquadStatus::Incomplete { missing, unfilled } => {
                assert_eq!(*missing, 11);
                assert_eq!(unfilled.len(), 4);
            }
            other => panic!("expected Incomplete, got {other:?}"),
        }
    }

    #[test]
    fn input_pool_is_not_mutated() {
        let pool = deep_pool();
        let before = pool.clone();
        let _ = select_best_xi(&pool, &CapacityConfig::default());
        assert_eq!(pool, before);
    }
}
