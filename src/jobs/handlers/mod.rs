// src/jobs/handlers/mod.rs

pub mod applicant;
pub mod employer;
