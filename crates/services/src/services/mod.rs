pub mod auto_fold;
pub mod check_in_reminder;
pub mod config;
pub mod obligation;
pub mod push;
pub mod snapshot;
pub mod stats;
pub mod weekly_recap;
