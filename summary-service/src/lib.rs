pub mod config;
pub mod dtos;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
pub mod validation;
