pub mod config;
pub mod keywords;
pub mod mode;
pub mod wrappers;
