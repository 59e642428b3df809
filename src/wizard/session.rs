//! The multi-step project-creation state machine.
//!
//! A [`WizardSession`] walks the seven steps in order, storing validated
//! data per step, and survives restarts through a persisted draft. The
//! invariant throughout: the cursor never sits past a step whose data is
//! missing or invalid, and submission requires every step validated.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::api::{ApiError, CreateVideoRequest, Job, QueueApi};
use crate::wizard::draft::DraftStore;
use crate::wizard::steps::{STEPS, StepForm, ValidationError, WizardStep};

/// Lifecycle of one creation flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WizardStatus {
    Draft,
    Submitting,
    Submitted,
    Failed,
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("wizard is not ready to submit: every step needs validated data")]
    NotReady,

    #[error("draft could not be persisted: {0}")]
    Draft(#[from] std::io::Error),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// One in-progress creation flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardSession {
    pub id: String,
    pub current_index: usize,
    /// Validated data per step; index matches [`STEPS`].
    pub step_data: Vec<Option<StepForm>>,
    pub status: WizardStatus,
    /// Failure message retained after a rejected submission.
    #[serde(default)]
    pub last_error: Option<String>,
}

impl WizardSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            current_index: 0,
            step_data: vec![None; STEPS.len()],
            status: WizardStatus::Draft,
            last_error: None,
        }
    }

    pub fn current_step(&self) -> WizardStep {
        STEPS[self.current_index]
    }

    pub fn data_for(&self, step: WizardStep) -> Option<&StepForm> {
        self.step_data[step.index()].as_ref()
    }

    /// True when every step holds validated data.
    pub fn is_complete(&self) -> bool {
        self.step_data
            .iter()
            .all(|slot| slot.as_ref().is_some_and(|form| form.validate().is_ok()))
    }

    fn first_unvalidated(&self) -> Option<usize> {
        self.step_data
            .iter()
            .position(|slot| !slot.as_ref().is_some_and(|form| form.validate().is_ok()))
    }

    /// Rehydrate a session from a persisted draft.
    ///
    /// `current_index` and `step_data` come back verbatim when the shape is
    /// sound; a structurally invalid draft is discarded for a fresh one.
    /// Stored forms that sit in the wrong slot or no longer validate are
    /// dropped, and the cursor is clamped to the first unvalidated step so
    /// the advance invariant holds again.
    pub fn restore(value: serde_json::Value) -> Self {
        let mut session = match serde_json::from_value::<WizardSession>(value) {
            Ok(s) if s.step_data.len() == STEPS.len() && s.current_index < STEPS.len() => s,
            _ => {
                log::warn!("discarding structurally invalid wizard draft");
                return Self::new();
            }
        };

        for (i, slot) in session.step_data.iter_mut().enumerate() {
            if let Some(form) = slot
                && (form.step().index() != i || form.validate().is_err())
            {
                *slot = None;
            }
        }
        if let Some(cap) = session.first_unvalidated() {
            session.current_index = session.current_index.min(cap);
        }
        // a submission cannot survive a restart mid-flight
        if session.status == WizardStatus::Submitting {
            session.status = WizardStatus::Draft;
        }
        session
    }
}

impl Default for WizardSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives a [`WizardSession`] and keeps its draft persisted.
pub struct Wizard<D: DraftStore> {
    session: WizardSession,
    drafts: D,
}

impl<D: DraftStore> Wizard<D> {
    /// Fresh session with no persisted history.
    pub fn new(drafts: D) -> Self {
        Self {
            session: WizardSession::new(),
            drafts,
        }
    }

    /// Pick up the persisted draft when one exists, otherwise start fresh.
    pub fn resume_or_new(drafts: D) -> Self {
        let session = match drafts.load() {
            Ok(Some(value)) => WizardSession::restore(value),
            Ok(None) => WizardSession::new(),
            Err(e) => {
                log::warn!("could not read wizard draft, starting fresh: {e}");
                WizardSession::new()
            }
        };
        Self { session, drafts }
    }

    pub fn session(&self) -> &WizardSession {
        &self.session
    }

    /// Validate and store the current step's data, then move forward.
    ///
    /// On validation failure nothing changes: the cursor stays, previously
    /// validated steps are untouched, and the error goes back to the caller.
    pub fn advance(&mut self, form: StepForm) -> Result<(), WizardError> {
        let step = self.session.current_step();
        if form.step() != step {
            return Err(ValidationError {
                step,
                message: format!("expected {step} data, got {}", form.step()),
            }
            .into());
        }
        form.validate()?;

        let i = self.session.current_index;
        self.session.step_data[i] = Some(form);
        if i + 1 < STEPS.len() {
            self.session.current_index = i + 1;
        }
        self.session.status = WizardStatus::Draft;
        self.session.last_error = None;
        self.drafts.save(&self.session)?;
        Ok(())
    }

    /// Step back without discarding the data of the step left behind.
    pub fn back(&mut self) {
        if self.session.current_index > 0 {
            self.session.current_index -= 1;
            if let Err(e) = self.drafts.save(&self.session) {
                log::warn!("could not persist wizard draft: {e}");
            }
        }
    }

    /// Submit the completed flow.
    ///
    /// Only legal on the final step with every step validated. On success
    /// the persisted draft is cleared and the created job returned (callers
    /// hand it to the job store as an optimistic insert). On failure the
    /// error is retained and the step data preserved so the user can retry
    /// without re-entering anything.
    pub async fn submit(&mut self, api: &dyn QueueApi) -> Result<Job, WizardError> {
        if self.session.current_index != STEPS.len() - 1 || !self.session.is_complete() {
            return Err(WizardError::NotReady);
        }
        let Some(request) = self.build_request() else {
            return Err(WizardError::NotReady);
        };

        self.session.status = WizardStatus::Submitting;
        match api.create_video(&request).await {
            Ok(job) => {
                self.session.status = WizardStatus::Submitted;
                if let Err(e) = self.drafts.clear() {
                    log::warn!("could not clear submitted draft: {e}");
                }
                Ok(job)
            }
            Err(e) => {
                self.session.status = WizardStatus::Failed;
                self.session.last_error = Some(e.to_string());
                if let Err(save) = self.drafts.save(&self.session) {
                    log::warn!("could not persist failed wizard draft: {save}");
                }
                Err(e.into())
            }
        }
    }

    /// Abandon the flow and drop the persisted draft.
    pub fn cancel(self) -> std::io::Result<()> {
        self.drafts.clear()
    }

    fn build_request(&self) -> Option<CreateVideoRequest> {
        let StepForm::Source { url } = self.session.data_for(WizardStep::Source)? else {
            return None;
        };
        let StepForm::Clip {
            start_secs,
            end_secs,
        } = self.session.data_for(WizardStep::Clip)?
        else {
            return None;
        };
        let StepForm::Frames { count } = self.session.data_for(WizardStep::Frames)? else {
            return None;
        };
        let StepForm::Research { enabled, topic } = self.session.data_for(WizardStep::Research)?
        else {
            return None;
        };
        let StepForm::Metadata {
            title,
            description,
            tags,
        } = self.session.data_for(WizardStep::Metadata)?
        else {
            return None;
        };
        let StepForm::Publish {
            visibility,
            scheduled_at,
        } = self.session.data_for(WizardStep::Publish)?
        else {
            return None;
        };

        Some(CreateVideoRequest {
            source_url: url.clone(),
            clip_start_secs: *start_secs,
            clip_end_secs: *end_secs,
            frame_count: *count,
            research_topic: if *enabled { topic.clone() } else { None },
            title: title.clone(),
            description: description.clone(),
            tags: tags.clone(),
            visibility: visibility.to_string(),
            scheduled_at: *scheduled_at,
        })
    }
}
