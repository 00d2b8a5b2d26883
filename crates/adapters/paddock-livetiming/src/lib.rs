pub mod config;
pub mod scan;
pub mod source;

pub use config::LiveTimingConfig;
pub use source::LiveTimingSource;
