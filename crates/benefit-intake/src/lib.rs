pub mod applicant;
pub mod config;
pub mod error;
pub mod program;
pub mod question;
pub mod telemetry;
