//! Jobs: the public board, search, categories and recruiter management.

pub mod categories;
pub mod filter;
pub mod handlers;
pub mod listing;
pub mod management;
pub mod store;
