mod duration;
mod settings;

pub use duration::{parse_duration, DurationParseError, SignedDuration};
pub use settings::{
    DatabaseConfig, DeliveryConfig, LogConfig, LogFormat, ServerConfig, Settings, SmtpConfig,
};
