// src/jobs/services/mod.rs

pub mod geo;
pub mod job_store;
pub mod matching;

pub use job_store::JobStore;
