// Library root: re-exports all modules so integration tests and the CLI
// can access the crate's public API.

pub mod config;
pub mod player;
pub mod selection;
pub mod simulation;

pub use player::{Player, Position};
pub use selection::{select_best_xi, Squad, SquadStatus};
pub use simulation::{compare_captains, estimate_uncertainty};
