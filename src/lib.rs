pub mod analysis;
pub mod catalog;
pub mod config;
pub mod error;
pub mod esb;
pub mod fetch;
pub mod ia;
pub mod junar;
pub mod server;
