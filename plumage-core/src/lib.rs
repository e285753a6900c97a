pub mod aspects;
pub mod classifier;
pub mod config;
pub mod error;
pub mod features;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod report;
pub mod subjectivity;
