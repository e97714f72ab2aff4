pub mod analyzers;
pub mod config;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod model;
pub mod normalize;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod schema;
pub mod stats;
