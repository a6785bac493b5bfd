#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("malformed job envelope")]
    MalformedEnvelope,

    #[error("job {0} not found")]
    JobNotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    pub fn code(&self) -> &'static str {
        match self {
            PipelineError::MalformedEnvelope => "JOB_MALFORMED_ENVELOPE",
            PipelineError::JobNotFound(_) => "JOB_NOT_FOUND",
            PipelineError::Other(_) => "SYSTEM_INTERNAL",
        }
    }
}
