pub mod config;
pub mod constants;
pub mod engine;
pub mod geometry;
pub mod input;
pub mod maze;
pub mod rng;
pub mod types;
