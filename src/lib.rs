#![doc = "The `sweep` library crate."]
#![doc = ""]
#![doc = "Task assignment lifecycle for the SWEEP marketplace: employers post job tasks,"]
#![doc = "assign them to students, and approve completed work for token rewards."]
#![doc = "The binary (`main.rs`) wires these modules into an actix-web server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

pub use crate::error::AppError;
pub use crate::services::AppState;
