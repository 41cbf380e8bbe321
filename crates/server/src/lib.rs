pub mod config;
pub mod error;
pub mod library_scan;
pub mod routes;
pub mod state;
