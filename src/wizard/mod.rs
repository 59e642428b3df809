mod draft;
mod project;
mod session;
mod steps;

pub use draft::{DraftStore, FileDraftStore};
pub use project::ProjectDefinition;
pub use session::{Wizard, WizardError, WizardSession, WizardStatus};
pub use steps::{STEPS, StepForm, ValidationError, Visibility, WizardStep};
