pub mod applications;
pub mod auth;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod guards;
pub mod jobs;
pub mod models;
pub mod preferences;
pub mod profiles;
pub mod routes;
pub mod session;
pub mod state;
pub mod tracked;
