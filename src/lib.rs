pub mod analysis;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod process;
pub mod schema;
pub mod snapshot;
