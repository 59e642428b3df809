use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The seven steps of the project-creation flow, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Source,
    Clip,
    Frames,
    Research,
    Metadata,
    Publish,
    Review,
}

pub const STEPS: [WizardStep; 7] = [
    WizardStep::Source,
    WizardStep::Clip,
    WizardStep::Frames,
    WizardStep::Research,
    WizardStep::Metadata,
    WizardStep::Publish,
    WizardStep::Review,
];

impl WizardStep {
    pub fn index(self) -> usize {
        match self {
            WizardStep::Source => 0,
            WizardStep::Clip => 1,
            WizardStep::Frames => 2,
            WizardStep::Research => 3,
            WizardStep::Metadata => 4,
            WizardStep::Publish => 5,
            WizardStep::Review => 6,
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WizardStep::Source => write!(f, "source"),
            WizardStep::Clip => write!(f, "clip"),
            WizardStep::Frames => write!(f, "frames"),
            WizardStep::Research => write!(f, "research"),
            WizardStep::Metadata => write!(f, "metadata"),
            WizardStep::Publish => write!(f, "publish"),
            WizardStep::Review => write!(f, "review"),
        }
    }
}

/// Validation failure for a single step. Never escapes the step it
/// originated in: the wizard stays put and the caller corrects the data.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid {step} data: {message}")]
pub struct ValidationError {
    pub step: WizardStep,
    pub message: String,
}

impl ValidationError {
    fn new(step: WizardStep, message: impl Into<String>) -> Self {
        Self {
            step,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    #[default]
    Unlisted,
    Private,
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Unlisted => write!(f, "unlisted"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

/// Validated data for one wizard step.
///
/// Serialized with an internal `step` tag so persisted drafts stay
/// self-describing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepForm {
    Source {
        url: String,
    },
    Clip {
        start_secs: u32,
        end_secs: u32,
    },
    Frames {
        count: u32,
    },
    Research {
        enabled: bool,
        #[serde(default)]
        topic: Option<String>,
    },
    Metadata {
        title: String,
        #[serde(default)]
        description: String,
        #[serde(default)]
        tags: Vec<String>,
    },
    Publish {
        visibility: Visibility,
        #[serde(default)]
        scheduled_at: Option<DateTime<Utc>>,
    },
    Review {
        confirmed: bool,
    },
}

impl StepForm {
    /// Which step this form belongs to.
    pub fn step(&self) -> WizardStep {
        match self {
            StepForm::Source { .. } => WizardStep::Source,
            StepForm::Clip { .. } => WizardStep::Clip,
            StepForm::Frames { .. } => WizardStep::Frames,
            StepForm::Research { .. } => WizardStep::Research,
            StepForm::Metadata { .. } => WizardStep::Metadata,
            StepForm::Publish { .. } => WizardStep::Publish,
            StepForm::Review { .. } => WizardStep::Review,
        }
    }

    /// Check the step's required fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            StepForm::Source { url } => {
                if url.starts_with("http://") || url.starts_with("https://") {
                    Ok(())
                } else {
                    Err(ValidationError::new(
                        WizardStep::Source,
                        "source url must be an http(s) link",
                    ))
                }
            }
            StepForm::Clip {
                start_secs,
                end_secs,
            } => {
                if end_secs > start_secs {
                    Ok(())
                } else {
                    Err(ValidationError::new(
                        WizardStep::Clip,
                        "clip end must be after clip start",
                    ))
                }
            }
            StepForm::Frames { count } => {
                if (1..=10).contains(count) {
                    Ok(())
                } else {
                    Err(ValidationError::new(
                        WizardStep::Frames,
                        "frame count must be between 1 and 10",
                    ))
                }
            }
            StepForm::Research { enabled, topic } => {
                if *enabled && topic.as_deref().is_none_or(|t| t.trim().is_empty()) {
                    Err(ValidationError::new(
                        WizardStep::Research,
                        "research topic is required when research is enabled",
                    ))
                } else {
                    Ok(())
                }
            }
            StepForm::Metadata { title, .. } => {
                if title.trim().is_empty() {
                    Err(ValidationError::new(
                        WizardStep::Metadata,
                        "title must not be empty",
                    ))
                } else {
                    Ok(())
                }
            }
            StepForm::Publish { .. } => Ok(()),
            StepForm::Review { confirmed } => {
                if *confirmed {
                    Ok(())
                } else {
                    Err(ValidationError::new(
                        WizardStep::Review,
                        "review must be confirmed before submission",
                    ))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_are_ordered_and_indexed() {
        for (i, step) in STEPS.iter().enumerate() {
            assert_eq!(step.index(), i);
        }
        assert_eq!(STEPS.len(), 7);
    }

    #[test]
    fn source_requires_http_link() {
        assert!(
            StepForm::Source {
                url: "https://videos.example/raw/1".into()
            }
            .validate()
            .is_ok()
        );
        let err = StepForm::Source {
            url: "ftp://nope".into(),
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.step, WizardStep::Source);
    }

    #[test]
    fn clip_rejects_inverted_range() {
        assert!(
            StepForm::Clip {
                start_secs: 5,
                end_secs: 30
            }
            .validate()
            .is_ok()
        );
        assert!(
            StepForm::Clip {
                start_secs: 30,
                end_secs: 30
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn frames_bounds() {
        assert!(StepForm::Frames { count: 1 }.validate().is_ok());
        assert!(StepForm::Frames { count: 10 }.validate().is_ok());
        assert!(StepForm::Frames { count: 0 }.validate().is_err());
        assert!(StepForm::Frames { count: 11 }.validate().is_err());
    }

    #[test]
    fn research_topic_required_only_when_enabled() {
        assert!(
            StepForm::Research {
                enabled: false,
                topic: None
            }
            .validate()
            .is_ok()
        );
        assert!(
            StepForm::Research {
                enabled: true,
                topic: Some("rust release history".into())
            }
            .validate()
            .is_ok()
        );
        assert!(
            StepForm::Research {
                enabled: true,
                topic: Some("   ".into())
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn metadata_requires_title() {
        assert!(
            StepForm::Metadata {
                title: "Weekly recap".into(),
                description: String::new(),
                tags: vec![]
            }
            .validate()
            .is_ok()
        );
        assert!(
            StepForm::Metadata {
                title: "  ".into(),
                description: String::new(),
                tags: vec![]
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn review_must_be_confirmed() {
        assert!(StepForm::Review { confirmed: true }.validate().is_ok());
        assert!(StepForm::Review { confirmed: false }.validate().is_err());
    }

    #[test]
    fn step_form_roundtrips_with_tag() {
        let form = StepForm::Publish {
            visibility: Visibility::Private,
            scheduled_at: None,
        };
        let json = serde_json::to_string(&form).unwrap();
        assert!(json.contains(r#""step":"publish""#));
        let parsed: StepForm = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, form);
    }

    #[test]
    fn validation_error_display() {
        let err = ValidationError::new(WizardStep::Clip, "clip end must be after clip start");
        assert_eq!(
            err.to_string(),
            "invalid clip data: clip end must be after clip start"
        );
    }
}
