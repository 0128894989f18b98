// src/profile/mod.rs
//! Account profile updates and the applicant's employment history

pub mod handlers;
pub mod models;
pub mod routes;
pub mod validators;

#[cfg(test)]
mod tests;

pub use routes::profile_routes;
