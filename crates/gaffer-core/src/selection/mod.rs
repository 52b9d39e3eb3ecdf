// Squad selection: greedy lineup assembly under capacity limits.

pub mod greedy;
pub mod squad;

pub use greedy::select_best_xi;
pub use squad::{Squad, SquadStatus, UnfilledQuota};
