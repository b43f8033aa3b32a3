pub mod attendance;
pub mod break_interval;
pub mod presence;
pub mod schedule;
pub mod student;
pub mod summary;
pub mod tap_log;
