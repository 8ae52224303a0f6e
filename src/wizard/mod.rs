//! Guided activities: a step schema plus an in-memory session that only
//! moves forward once the active step's required answers are filled in.

pub mod builders;
pub mod goal;
pub mod revision;
pub mod schema;
pub mod session;

pub use builders::{
    PromptStep,
    PromptedBuilder,
};
pub use goal::{
    Goal,
    GoalBuilder,
    GoalField,
};
pub use revision::{
    RevisionCycle,
    RevisionCycleState,
    RevisionField,
    RevisionStage,
};
pub use schema::{
    FieldSpec,
    FieldValue,
    Record,
    Route,
    Schema,
    StepSpec,
};
pub use session::{
    Advance,
    SessionState,
    WizardSession,
};
