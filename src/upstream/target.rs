use std::fmt;
use std::str::FromStr;

use crate::config::UpstreamConfig;
use crate::error::AppError;

/// Named operations exposed by the workflow backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Ingest,
    StartIdea,
    UpdateStatus,
    Transcribe,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Ingest => "ingest",
            Target::StartIdea => "start-idea",
            Target::UpdateStatus => "update-status",
            Target::Transcribe => "transcribe",
        }
    }

    /// Path suffix appended to the upstream base URL. Unset paths are empty.
    pub fn path<'a>(&self, config: &'a UpstreamConfig) -> &'a str {
        match self {
            Target::Ingest => &config.ingest_path,
            Target::StartIdea => &config.start_idea_path,
            Target::UpdateStatus => &config.update_status_path,
            Target::Transcribe => &config.transcribe_path,
        }
    }
}

impl FromStr for Target {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ingest" => Ok(Target::Ingest),
            "start-idea" => Ok(Target::StartIdea),
            "update-status" => Ok(Target::UpdateStatus),
            "transcribe" => Ok(Target::Transcribe),
            other => Err(AppError::UnknownTarget(other.to_string())),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
