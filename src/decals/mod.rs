// src/decals/mod.rs
//! NFC decals employers place on site and the scans applicants make of them

pub mod handlers;
pub mod models;
pub mod routes;
pub mod validators;


pub use routes::decal_routes;
