mod api;
mod config;
mod error;

pub mod data_objects;
pub mod webhook;

pub use api::PaystackApi;
pub use config::PaystackConfig;
pub use error::PaystackApiError;
