pub mod activities;
pub mod checkins;
pub mod leaderboard;
pub mod macros;
pub mod scores;
