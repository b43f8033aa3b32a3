pub mod config;
pub mod db;
pub mod export;
pub mod init;
pub mod log;
pub mod logs;
pub mod records;
pub mod report;
pub mod schedule;
pub mod student;
pub mod tap;
