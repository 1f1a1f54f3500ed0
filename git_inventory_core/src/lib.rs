pub mod config;
pub mod driver;
pub mod error;
pub mod ini;
pub mod inventory;
pub mod logger;
pub mod repository;
pub mod workspace;
