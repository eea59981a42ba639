pub mod config;
pub mod crypto;
pub mod error;
pub mod job_controller;
pub mod services;
