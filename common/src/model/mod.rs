pub mod analyze;
pub mod certificate;
pub mod mapping;
