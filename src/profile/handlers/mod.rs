// src/profile/handlers/mod.rs

pub mod employment;
pub mod profile;
