pub mod client;
pub mod feed;
pub mod models;
pub mod provider;

pub use client::FootballData;
pub use feed::MatchFeed;
pub use models::Fixture;
pub use provider::MatchProvider;
