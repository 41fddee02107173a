pub mod app;
pub mod config;
pub mod error;
pub mod net;
pub mod queue;
pub mod run;
pub mod scenario;
pub mod sim;
pub mod stats;
pub mod topo;
pub mod trace;

pub use error::{Error, Result};

#[cfg(test)]
mod test;
