pub mod normalize;
pub mod opponents;
pub mod roster;

pub use opponents::{FixtureOpponentResolver, OpponentResolver, StaticOpponentResolver};
pub use roster::{filter_by_term, Team, TeamRoster};
