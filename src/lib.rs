pub mod core;
pub mod models;
