pub mod apis;
pub mod config;
pub mod constants;
pub mod enrich;
pub mod error;
pub mod export;
pub mod logging;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod types;
