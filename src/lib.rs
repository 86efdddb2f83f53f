// src/lib.rs

pub mod config;
pub mod error;
pub mod grader;
pub mod handlers;
pub mod models;
pub mod ranking;
pub mod routes;
pub mod state;

// Re-export specific items for convenience if needed
pub use routes::create_router;
