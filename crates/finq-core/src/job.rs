//! Job types: submission receipts, polled status reports, and the live
//! progress view.

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Status of a server-side query job.
///
/// The server maps Celery task states onto these strings; `running` and
/// `processing` are the same state under two names, and states the server
/// cannot classify come back as `unknown` (still in flight).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(from = "String", into = "String")]
#[strum(serialize_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Error,
    Cancelled,
    Unknown,
}

impl From<String> for JobStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => Self::Pending,
            "running" | "processing" => Self::Running,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "error" => Self::Error,
            "cancelled" => Self::Cancelled,
            _ => Self::Unknown,
        }
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.to_string()
    }
}

impl JobStatus {
    /// Whether the job has reached a state it will never leave.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Error | Self::Cancelled
        )
    }

    /// Whether the job terminated without producing a usable result.
    pub fn is_failure(self) -> bool {
        matches!(self, Self::Failed | Self::Error | Self::Cancelled)
    }
}

/// Receipt returned by `POST /api/query`. Extra response fields (status
/// message, output directory) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSubmission {
    pub job_id: String,
    /// The conversation the job runs against; for draft submissions this is
    /// the id of the conversation the server just created.
    pub conversation_id: i64,
}

/// One answer from `GET /api/jobs/{job_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobStatusReport {
    pub status: JobStatus,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub stage: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// The live progress view of the single outstanding job, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct JobProgress {
    pub is_active: bool,
    /// Percent complete, clamped to 0..=100
    pub progress: u8,
    pub stage: String,
}

impl JobProgress {
    /// Progress of a job still in flight.
    pub fn active(progress: f64, stage: impl Into<String>) -> Self {
        Self {
            is_active: true,
            progress: progress.clamp(0.0, 100.0).round() as u8,
            stage: stage.into(),
        }
    }

    /// The inactive state: no outstanding job.
    pub fn idle() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_aliases() {
        let status: JobStatus = serde_json::from_str(r#""processing""#).unwrap();
        assert_eq!(status, JobStatus::Running);
        let status: JobStatus = serde_json::from_str(r#""running""#).unwrap();
        assert_eq!(status, JobStatus::Running);
    }

    #[test]
    fn test_unmapped_status_is_unknown_and_non_terminal() {
        let status: JobStatus = serde_json::from_str(r#""revoked-ish""#).unwrap();
        assert_eq!(status, JobStatus::Unknown);
        assert!(!status.is_terminal());
    }

    #[test]
    fn test_terminal_set() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::Error.is_terminal());
        assert!(JobStatus::Cancelled.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Running.is_terminal());
        assert!(!JobStatus::Completed.is_failure());
        assert!(JobStatus::Cancelled.is_failure());
    }

    #[test]
    fn test_report_from_server_json() {
        let json = r#"{
            "job_id": "a3f1",
            "status": "processing",
            "stage": "Generating SQL query",
            "progress": 45.0,
            "files": {},
            "results": null,
            "error": null
        }"#;
        let report: JobStatusReport = serde_json::from_str(json).unwrap();
        assert_eq!(report.status, JobStatus::Running);
        assert_eq!(report.stage, "Generating SQL query");
        assert_eq!(report.progress, 45.0);
    }

    #[test]
    fn test_progress_clamps() {
        assert_eq!(JobProgress::active(123.4, "done").progress, 100);
        assert_eq!(JobProgress::active(-3.0, "init").progress, 0);
        assert!(!JobProgress::idle().is_active);
    }

    #[test]
    fn test_submission_ignores_extra_fields() {
        let json = r#"{
            "job_id": "a3f1",
            "conversation_id": 42,
            "status": "pending",
            "message": "queued",
            "output_dir": "output/20250401_a3f1"
        }"#;
        let submission: JobSubmission = serde_json::from_str(json).unwrap();
        assert_eq!(submission.job_id, "a3f1");
        assert_eq!(submission.conversation_id, 42);
    }
}
