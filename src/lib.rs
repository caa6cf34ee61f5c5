pub mod ai_client;
pub mod config;
pub mod error;
pub mod extractor;
pub mod models;
pub mod pipeline;
pub mod repository;
pub mod routes;
