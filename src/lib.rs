pub mod address;
pub mod alert;
pub mod api;
pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod receive;
pub mod registry;
pub mod shield;
