//! Non-interactive project definitions.
//!
//! `pipedeck create --file project.toml` feeds the wizard from a TOML file
//! instead of prompting step by step. The file maps onto the same step
//! forms, so every answer still passes the per-step validation.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::wizard::steps::{StepForm, Visibility};

fn default_frame_count() -> u32 {
    3
}

/// All wizard answers in one document.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectDefinition {
    pub source_url: String,
    pub clip_start_secs: u32,
    pub clip_end_secs: u32,
    #[serde(default = "default_frame_count")]
    pub frame_count: u32,
    #[serde(default)]
    pub research_topic: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
}

impl ProjectDefinition {
    /// One form per wizard step, in step order. The review step is
    /// confirmed implicitly: providing the file is the confirmation.
    pub fn forms(&self) -> [StepForm; 7] {
        [
            StepForm::Source {
                url: self.source_url.clone(),
            },
            StepForm::Clip {
                start_secs: self.clip_start_secs,
                end_secs: self.clip_end_secs,
            },
            StepForm::Frames {
                count: self.frame_count,
            },
            StepForm::Research {
                enabled: self.research_topic.is_some(),
                topic: self.research_topic.clone(),
            },
            StepForm::Metadata {
                title: self.title.clone(),
                description: self.description.clone(),
                tags: self.tags.clone(),
            },
            StepForm::Publish {
                visibility: self.visibility,
                scheduled_at: self.scheduled_at,
            },
            StepForm::Review { confirmed: true },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::draft::MemoryDraftStore;
    use crate::wizard::session::Wizard;
    use crate::wizard::steps::STEPS;

    const MINIMAL: &str = r#"
        source_url = "https://videos.example/raw/7"
        clip_start_secs = 10
        clip_end_secs = 95
        title = "Launch teaser"
    "#;

    #[test]
    fn minimal_toml_uses_defaults() {
        let def: ProjectDefinition = toml::from_str(MINIMAL).unwrap();
        assert_eq!(def.frame_count, 3);
        assert_eq!(def.visibility, Visibility::Unlisted);
        assert_eq!(def.research_topic, None);
        assert!(def.tags.is_empty());
    }

    #[test]
    fn forms_walk_the_wizard_to_completion() {
        let def: ProjectDefinition = toml::from_str(MINIMAL).unwrap();
        let mut wizard = Wizard::new(MemoryDraftStore::new());
        for form in def.forms() {
            wizard.advance(form).unwrap();
        }
        assert_eq!(wizard.session().current_index, STEPS.len() - 1);
        assert!(wizard.session().is_complete());
    }

    #[test]
    fn full_toml_parses() {
        let def: ProjectDefinition = toml::from_str(
            r#"
            source_url = "https://videos.example/raw/8"
            clip_start_secs = 0
            clip_end_secs = 42
            frame_count = 6
            research_topic = "city skyline footage"
            title = "Skyline cut"
            description = "b-roll compilation"
            tags = ["b-roll", "city"]
            visibility = "private"
            scheduled_at = "2026-08-01T09:00:00Z"
        "#,
        )
        .unwrap();
        assert_eq!(def.visibility, Visibility::Private);
        assert!(def.scheduled_at.is_some());
        let forms = def.forms();
        assert!(forms.iter().all(|f| f.validate().is_ok()));
    }
}
