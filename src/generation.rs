//! Generation jobs
//!
//! Caller-side lifecycle around one render: `Draft -> Generating -> Ready`
//! or `Failed`. `Ready` and `Failed` are terminal; retrying means creating a
//! new job. Renders are pure, so failures the engine reports are never
//! retryable; `retryable` is left for callers tagging their own failures.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

use crate::config::CalendarConfig;
use crate::pipeline::{CalendarEngine, EngineError, RenderManifest, RenderedCalendar};
use crate::print::PrintSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GenerationStatus {
    Draft,
    Generating,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Configuration,
    Rendering,
}

/// Why a job failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFailure {
    pub stage: FailureStage,
    pub message: String,
    pub retryable: bool,
}

impl From<&EngineError> for JobFailure {
    fn from(err: &EngineError) -> Self {
        match err {
            EngineError::Configuration(e) => Self {
                stage: FailureStage::Configuration,
                message: e.to_string(),
                retryable: false,
            },
            EngineError::Rendering(e) => Self {
                stage: FailureStage::Rendering,
                message: e.to_string(),
                retryable: false,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot {action} a job in state {from:?}")]
pub struct TransitionError {
    pub from: GenerationStatus,
    pub action: &'static str,
}

#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Transition(#[from] TransitionError),

    #[error("generation failed: {}", .0.message)]
    Failed(JobFailure),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationJob {
    pub id: Uuid,
    pub status: GenerationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub failure: Option<JobFailure>,
    #[serde(default)]
    pub manifest: Option<RenderManifest>,
}

impl GenerationJob {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            status: GenerationStatus::Draft,
            created_at: now,
            updated_at: now,
            failure: None,
            manifest: None,
        }
    }

    fn transition(&mut self, to: GenerationStatus) {
        log::debug!("job {}: {:?} -> {:?}", self.id, self.status, to);
        self.status = to;
        self.updated_at = Utc::now();
    }

    /// Only a draft can start.
    pub fn start(&mut self) -> Result<(), TransitionError> {
        if self.status != GenerationStatus::Draft {
            return Err(TransitionError { from: self.status, action: "start" });
        }
        self.transition(GenerationStatus::Generating);
        Ok(())
    }

    pub fn complete(&mut self, manifest: RenderManifest) -> Result<(), TransitionError> {
        if self.status != GenerationStatus::Generating {
            return Err(TransitionError { from: self.status, action: "complete" });
        }
        self.manifest = Some(manifest);
        self.transition(GenerationStatus::Ready);
        Ok(())
    }

    pub fn fail(&mut self, failure: JobFailure) -> Result<(), TransitionError> {
        if self.status != GenerationStatus::Generating {
            return Err(TransitionError { from: self.status, action: "fail" });
        }
        log::warn!("job {} failed at {:?}: {}", self.id, failure.stage, failure.message);
        self.failure = Some(failure);
        self.transition(GenerationStatus::Failed);
        Ok(())
    }

    /// Start the job, render, and record the outcome. A failed job keeps no
    /// artifact.
    pub fn run(
        &mut self,
        engine: &CalendarEngine<'_>,
        config: &CalendarConfig,
        holiday_map: &BTreeMap<NaiveDate, String>,
        spec: &PrintSpec,
    ) -> Result<RenderedCalendar, JobError> {
        self.start()?;
        match engine.render_print(config, holiday_map, spec) {
            Ok(rendered) => {
                self.complete(rendered.manifest.clone())?;
                Ok(rendered)
            }
            Err(err) => {
                let failure = JobFailure::from(&err);
                self.fail(failure.clone())?;
                Err(JobError::Failed(failure))
            }
        }
    }
}

impl Default for GenerationJob {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::print::RenderingError;

    fn manifest() -> RenderManifest {
        RenderManifest {
            engine_version: "1.0.0".into(),
            config_hash: "abc".into(),
            markup_hash: "def".into(),
            print_hash: None,
            month_count: 12,
        }
    }

    #[test]
    fn test_happy_path() {
        let mut job = GenerationJob::new();
        assert_eq!(job.status, GenerationStatus::Draft);
        job.start().unwrap();
        job.complete(manifest()).unwrap();
        assert_eq!(job.status, GenerationStatus::Ready);
        assert!(job.manifest.is_some());
        assert!(job.updated_at >= job.created_at);
    }

    #[test]
    fn test_illegal_transitions() {
        let mut job = GenerationJob::new();
        assert_eq!(
            job.complete(manifest()).unwrap_err(),
            TransitionError { from: GenerationStatus::Draft, action: "complete" }
        );
        job.start().unwrap();
        job.complete(manifest()).unwrap();
        assert!(job.start().is_err());
        assert!(job.fail(JobFailure { stage: FailureStage::Rendering, message: "x".into(), retryable: true }).is_err());
    }

    #[test]
    fn test_failed_is_terminal() {
        let config_error = EngineError::Configuration(crate::config::ConfigurationError::InvalidYear(1));
        let render_error = EngineError::Rendering(RenderingError::EmptyDocument);

        for (err, stage) in [(config_error, FailureStage::Configuration), (render_error, FailureStage::Rendering)] {
            let mut job = GenerationJob::new();
            job.start().unwrap();
            job.fail(JobFailure::from(&err)).unwrap();
            assert_eq!(job.status, GenerationStatus::Failed);

            let failure = job.failure.clone().unwrap();
            assert_eq!(failure.stage, stage);
            assert!(!failure.retryable);

            assert_eq!(
                job.start().unwrap_err(),
                TransitionError { from: GenerationStatus::Failed, action: "start" }
            );
            assert_eq!(job.status, GenerationStatus::Failed);
            assert_eq!(job.failure, Some(failure));
        }
    }

    #[test]
    fn test_retryable_tag_does_not_reopen_a_job() {
        let mut job = GenerationJob::new();
        job.start().unwrap();
        job.fail(JobFailure { stage: FailureStage::Rendering, message: "disk full".into(), retryable: true }).unwrap();
        assert!(job.start().is_err());
        assert_eq!(job.status, GenerationStatus::Failed);
    }

    #[test]
    fn test_run_records_configuration_failure() {
        let engine = CalendarEngine::builtin();
        let mut job = GenerationJob::new();
        let err = job
            .run(&engine, &CalendarConfig::new(3000), &BTreeMap::new(), &PrintSpec::default())
            .unwrap_err();
        assert!(matches!(err, JobError::Failed(ref f) if !f.retryable));
        assert_eq!(job.status, GenerationStatus::Failed);
        assert!(job.manifest.is_none());
    }
}
