pub mod check_in;
pub mod pact;
pub mod pact_participant;
pub mod profile;
pub mod roast_thread;
pub mod weekday_set;
pub mod weekly_recap;
