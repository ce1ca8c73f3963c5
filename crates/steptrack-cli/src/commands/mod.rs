pub mod config;
pub mod samples;
pub mod today;
pub mod watch;
pub mod week;
