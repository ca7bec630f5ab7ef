use serde::{Deserialize, Serialize};

/// Commands accepted by the server's job queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobCommand {
    Start,
    Pause,
    Resume,
    Empty,
    ClearFailed,
}

impl JobCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobCommand::Start => "start",
            JobCommand::Pause => "pause",
            JobCommand::Resume => "resume",
            JobCommand::Empty => "empty",
            JobCommand::ClearFailed => "clear-failed",
        }
    }
}

/// Maintenance jobs the server can be asked to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobName {
    PersonCleanup,
    TagCleanup,
    UserCleanup,
}

impl JobName {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobName::PersonCleanup => "person-cleanup",
            JobName::TagCleanup => "tag-cleanup",
            JobName::UserCleanup => "user-cleanup",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobCounts {
    pub active: i64,
    pub completed: i64,
    pub failed: i64,
    pub delayed: i64,
    pub waiting: i64,
    pub paused: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueueStatus {
    pub is_active: bool,
    pub is_paused: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Job {
    pub job_counts: JobCounts,
    pub queue_status: QueueStatus,
}
