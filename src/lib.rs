pub mod client;
pub mod config;
pub mod page;
pub mod relay;
pub mod routes;
pub mod types;
