pub mod client;
pub mod config;
pub mod error;
pub mod job;
pub mod manifest;
pub mod mapper;
pub mod plan;
pub mod resource;
