pub mod breaks;
pub mod convert;
pub mod flags;
pub mod log;
pub mod policy;
pub mod report;
pub mod resolver;
pub mod tap;
