//! # Auth Module
//!
//! Account authentication for employers and applicants:
//! - Password signup with OTP verification
//! - Password signin and password reset through OTP
//! - Google and LinkedIn OAuth login with one-time auth codes
//! - Access/refresh JWT issuance and the `refreshToken` cookie
//! - AuthedUser extractor for protected routes

pub mod cookies;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod validators;


pub use extractors::AuthedUser;
pub use handlers::auth_failure;
pub use routes::auth_routes;
