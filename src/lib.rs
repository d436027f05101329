pub mod collector;
pub mod config;
pub mod export;
pub mod mapper;
pub mod models;
pub mod query;
pub mod window;
pub mod zones;
