use schemars::JsonSchema;
use serde::Deserialize;
use tracing_appender::rolling::Rotation;

/// How often a new log file is started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogRotationKind {
    #[serde(alias = "Minutely", alias = "MINUTELY")]
    Minutely,
    #[serde(alias = "Hourly", alias = "HOURLY")]
    Hourly,
    #[serde(alias = "Daily", alias = "DAILY")]
    Daily,
    #[serde(alias = "Never", alias = "NEVER")]
    Never,
}

impl From<LogRotationKind> for Rotation {
    fn from(value: LogRotationKind) -> Self {
        match value {
            LogRotationKind::Minutely => Rotation::MINUTELY,
            LogRotationKind::Hourly => Rotation::HOURLY,
            LogRotationKind::Daily => Rotation::DAILY,
            LogRotationKind::Never => Rotation::NEVER,
        }
    }
}
