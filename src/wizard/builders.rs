use std::collections::BTreeMap;

use super::{
    schema::{
        FieldSpec,
        FieldValue,
        Schema,
        StepSpec,
    },
    session::{
        Advance,
        SessionState,
        WizardSession,
    },
};
use crate::{
    core::LearnError,
    vocab::STRATEGY_STEPS,
};

#[derive(Debug, Clone, Copy)]
pub struct PromptStep {
    pub key: &'static str,
    pub title: &'static str,
    pub prompt: &'static str,
    pub tip: Option<&'static str>,
}

pub const WORD_BUILDER_STEPS: [PromptStep; 8] = [
    PromptStep {
        key: STRATEGY_STEPS[0].0,
        title: "Word Identification",
        prompt: "Enter a word, term, symbol, or abbreviation you don't fully understand.",
        tip: None,
    },
    PromptStep {
        key: STRATEGY_STEPS[1].0,
        title: "Get the Meaning",
        prompt: "What is the meaning or definition of this word in the subject you're studying?",
        tip: Some("Use a subject-specific source, like a textbook, teacher, or trusted website."),
    },
    PromptStep {
        key: STRATEGY_STEPS[2].0,
        title: "Create an Example",
        prompt: "What's a personal or visual example that helps make this word clear to you?",
        tip: Some("Choose something interesting or memorable."),
    },
    PromptStep {
        key: STRATEGY_STEPS[3].0,
        title: "Visualise the Example",
        prompt: "Close your eyes and picture the example clearly. Now describe what you see.",
        tip: None,
    },
    PromptStep {
        key: STRATEGY_STEPS[4].0,
        title: "Add a Sound",
        prompt: "Add a sound to your mental picture. What do you hear in the scene?",
        tip: None,
    },
    PromptStep {
        key: STRATEGY_STEPS[5].0,
        title: "Add Emotion",
        prompt: "How do you feel in the scene? Add a strong emotion to help you remember.",
        tip: None,
    },
    PromptStep {
        key: STRATEGY_STEPS[6].0,
        title: "See the Word in the Scene",
        prompt: "Now imagine the word itself written somewhere in your scene. Where do you see it?",
        tip: None,
    },
    PromptStep {
        key: STRATEGY_STEPS[7].0,
        title: "Hear the Word in the Scene",
        prompt: "Imagine someone saying the word out loud in your example. What does it sound like?",
        tip: None,
    },
];

pub const VIRTUAL_READING_STEPS: [PromptStep; 5] = [
    PromptStep {
        key: "see",
        title: "See It",
        prompt: "Picture the words in your head. What do you see?",
        tip: None,
    },
    PromptStep {
        key: "visualise",
        title: "Visualise It",
        prompt: "Turn the words into a mental picture. What do you imagine?",
        tip: None,
    },
    PromptStep {
        key: "sound",
        title: "Add Sound",
        prompt: "What sound would be part of this scene?",
        tip: None,
    },
    PromptStep {
        key: "emotion",
        title: "Add Emotion",
        prompt: "How would you feel if this happened to you?",
        tip: None,
    },
    PromptStep {
        key: "describe",
        title: "Describe It",
        prompt: "Now, describe your full scene in one sentence.",
        tip: None,
    },
];

/// One required text answer per step.
pub fn prompted_schema(name: &'static str, steps: &[PromptStep]) -> Schema {
    steps.iter().fold(Schema::new(name), |schema, step| {
        schema.step(
            StepSpec::new(step.key, step.title)
                .field(FieldSpec::text(step.key))
                .incomplete("Please write an answer before moving on"),
        )
    })
}

/// Walks a fixed list of single-answer prompts.
#[derive(Debug, Clone)]
pub struct PromptedBuilder {
    steps: &'static [PromptStep],
    session: WizardSession,
}

impl PromptedBuilder {
    pub fn word_builder() -> Self {
        Self::new("word_builder", &WORD_BUILDER_STEPS)
    }

    pub fn virtual_reading() -> Self {
        Self::new("virtual_reading", &VIRTUAL_READING_STEPS)
    }

    fn new(name: &'static str, steps: &'static [PromptStep]) -> Self {
        Self { steps, session: WizardSession::new(prompted_schema(name, steps)) }
    }

    pub fn current_prompt(&self) -> Option<&PromptStep> {
        match self.session.state() {
            SessionState::Active { index, .. } => self.steps.get(index),
            SessionState::Complete => None,
        }
    }

    pub fn answer(&mut self, text: &str) -> Result<(), LearnError> {
        let key = self
            .current_prompt()
            .map(|step| step.key)
            .ok_or_else(|| LearnError::Validation("Activity already complete".to_string()))?;
        self.session.set(key, text)
    }

    pub fn current_answer(&self) -> &str {
        self.current_prompt().map(|step| self.session.text(step.key)).unwrap_or("")
    }

    pub fn advance(&mut self) -> Advance {
        self.session.advance()
    }

    pub fn is_complete(&self) -> bool {
        self.session.is_complete()
    }

    pub fn progress(&self) -> (usize, usize) {
        self.session.progress()
    }

    /// Answers in step order, blanks for unanswered steps.
    pub fn responses(&self) -> Vec<String> {
        self.steps.iter().map(|step| self.session.text(step.key).trim().to_string()).collect()
    }

    /// Answers keyed by step, in the shape stored on a vocabulary word.
    pub fn strategy_data(&self) -> BTreeMap<String, String> {
        self.session
            .record()
            .iter()
            .filter_map(|(key, value)| match value {
                FieldValue::Text(text) => Some((key.clone(), text.trim().to_string())),
                FieldValue::Flag(_) => None,
            })
            .collect()
    }

    /// The word being studied (first word-builder answer).
    pub fn word(&self) -> &str {
        self.steps.first().map(|step| self.session.text(step.key).trim()).unwrap_or("")
    }

    pub fn restart(&mut self) {
        self.session.reset();
    }
}
