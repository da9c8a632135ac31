pub mod application;
pub mod company;
pub mod job;
pub mod profile;
