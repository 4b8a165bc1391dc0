pub mod client;
pub mod models;

pub use client::{Result, YtDlpClient, YtDlpError};
pub use models::YtDlpConfig;
