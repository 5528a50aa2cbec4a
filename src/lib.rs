pub mod api;
pub mod config;
pub mod entities;
pub mod herd;
pub mod metrics;
pub mod migrator;
pub mod telemetry;

pub use sea_orm;
