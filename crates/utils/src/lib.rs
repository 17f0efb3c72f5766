pub mod calendar;
pub mod response;
pub mod sentry;
