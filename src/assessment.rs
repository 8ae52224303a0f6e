//! Two-part self assessment: five sensory-preference questions followed by
//! five beliefs and study-habit questions, each answered A, B or C.

use serde::{
    Deserialize,
    Serialize,
};

use crate::core::LearnError;

pub const QUESTIONS_PER_SECTION: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Answer {
    A,
    B,
    C,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Sensory,
    Beliefs,
}

#[derive(Debug, Clone, Copy)]
pub struct Question {
    pub title: &'static str,
    pub prompt: &'static str,
    pub options: [&'static str; 3],
}

pub static SENSORY_QUESTIONS: [Question; QUESTIONS_PER_SECTION] = [
    Question {
        title: "Spelling",
        prompt: "When I try to spell a difficult word…",
        options: [
            "I see the word in my mind and read it visually.",
            "I sound it out or hear it in my head.",
            "I write it out or trace it with my finger to feel it.",
        ],
    },
    Question {
        title: "Reading",
        prompt: "When I read a passage for comprehension…",
        options: [
            "I visualize what I'm reading as a movie or picture.",
            "I hear the words clearly in my mind.",
            "I get a sense or feeling of the meaning behind the words.",
        ],
    },
    Question {
        title: "Understanding",
        prompt: "When I want to understand something new…",
        options: [
            "I look at diagrams, maps, or videos.",
            "I listen to explanations or talk it through.",
            "I need to do it, build it, or physically engage with it.",
        ],
    },
    Question {
        title: "Memorizing",
        prompt: "To remember a list of items…",
        options: [
            "I picture the items in my mind.",
            "I repeat the list aloud or in my mind.",
            "I associate each item with a movement or feeling.",
        ],
    },
    Question {
        title: "Remembering",
        prompt: "When trying to remember past events…",
        options: [
            "I see the images in my mind, like a photo or movie.",
            "I hear voices or sounds from the event.",
            "I remember how I felt or what I was doing physically.",
        ],
    },
];

pub static BELIEFS_QUESTIONS: [Question; QUESTIONS_PER_SECTION] = [
    Question {
        title: "Belief in Learning Ability",
        prompt: "When I think about learning something new…",
        options: [
            "I believe I can learn it if I try hard enough.",
            "I'm not sure, it depends if I'm \"good at it\" or not.",
            "I often doubt my ability and feel like I'll fail.",
        ],
    },
    Question {
        title: "Reactions to Mistakes",
        prompt: "When I make a mistake while studying…",
        options: [
            "I see it as a chance to improve and learn.",
            "I feel discouraged but try to move on.",
            "I feel like I'm just not cut out for the subject.",
        ],
    },
    Question {
        title: "Study Organization",
        prompt: "How do you usually organize your studies?",
        options: [
            "I use planners, apps, or checklists to track tasks and progress.",
            "I sometimes make a plan, but often forget to follow it.",
            "I don't really have a system, I just go with the flow.",
        ],
    },
    Question {
        title: "Goal-Setting",
        prompt: "How do you set academic goals?",
        options: [
            "I break them into steps and track my progress.",
            "I set general goals, but don't always follow up.",
            "I don't really set learning goals.",
        ],
    },
    Question {
        title: "Study Reflection",
        prompt: "At the end of a study session…",
        options: [
            "I reflect on what I've learned and what to do next.",
            "I sometimes think about it but not regularly.",
            "I usually just finish and forget about it.",
        ],
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LearningStyle {
    Visual,
    Auditory,
    Kinesthetic,
}

impl LearningStyle {
    pub fn title(&self) -> &'static str {
        match self {
            LearningStyle::Visual => "Visual Learner",
            LearningStyle::Auditory => "Auditory Learner",
            LearningStyle::Kinesthetic => "Kinesthetic Learner",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            LearningStyle::Visual => {
                "You learn best through visual information like diagrams, charts, and images."
            }
            LearningStyle::Auditory => {
                "You learn best through listening, discussions, and verbal explanations."
            }
            LearningStyle::Kinesthetic => {
                "You learn best through hands-on activities and physical engagement."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeliefsLevel {
    StrongFoundation,
    GoodProgress,
    GrowthOpportunity,
}

impl BeliefsLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            8.. => BeliefsLevel::StrongFoundation,
            5..=7 => BeliefsLevel::GoodProgress,
            _ => BeliefsLevel::GrowthOpportunity,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            BeliefsLevel::StrongFoundation => "Strong Foundation",
            BeliefsLevel::GoodProgress => "Good Progress",
            BeliefsLevel::GrowthOpportunity => "Growth Opportunity",
        }
    }
}

/// Most frequent answer; ties go to A, then B, then C.
pub fn sensory_style(answers: &[Answer]) -> LearningStyle {
    let count = |wanted: Answer| answers.iter().filter(|a| **a == wanted).count();
    let (a, b, c) = (count(Answer::A), count(Answer::B), count(Answer::C));
    let max = a.max(b).max(c);
    if a == max {
        LearningStyle::Visual
    } else if b == max {
        LearningStyle::Auditory
    } else {
        LearningStyle::Kinesthetic
    }
}

/// A scores 2, B scores 1, C scores nothing.
pub fn beliefs_score(answers: &[Answer]) -> u32 {
    answers
        .iter()
        .map(|answer| match answer {
            Answer::A => 2,
            Answer::B => 1,
            Answer::C => 0,
        })
        .sum()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub style: LearningStyle,
    pub beliefs_score: u32,
    pub beliefs_level: BeliefsLevel,
}

/// Walks the ten questions in order. Answering moves straight to the next one.
#[derive(Debug, Clone, Default)]
pub struct Assessment {
    sensory: Vec<Answer>,
    beliefs: Vec<Answer>,
}

impl Assessment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Section and index of the question awaiting an answer.
    pub fn position(&self) -> Option<(Section, usize)> {
        if self.sensory.len() < QUESTIONS_PER_SECTION {
            Some((Section::Sensory, self.sensory.len()))
        } else if self.beliefs.len() < QUESTIONS_PER_SECTION {
            Some((Section::Beliefs, self.beliefs.len()))
        } else {
            None
        }
    }

    pub fn current_question(&self) -> Option<&'static Question> {
        self.position().map(|(section, index)| match section {
            Section::Sensory => &SENSORY_QUESTIONS[index],
            Section::Beliefs => &BELIEFS_QUESTIONS[index],
        })
    }

    pub fn answer(&mut self, answer: Answer) -> Result<(), LearnError> {
        match self.position() {
            Some((Section::Sensory, _)) => self.sensory.push(answer),
            Some((Section::Beliefs, _)) => self.beliefs.push(answer),
            None => return Err(LearnError::Validation("Assessment already complete".to_string())),
        }
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.position().is_none()
    }

    pub fn result(&self) -> Option<AssessmentResult> {
        if !self.is_complete() {
            return None;
        }
        let score = beliefs_score(&self.beliefs);
        Some(AssessmentResult {
            style: sensory_style(&self.sensory),
            beliefs_score: score,
            beliefs_level: BeliefsLevel::from_score(score),
        })
    }

    pub fn restart(&mut self) {
        self.sensory.clear();
        self.beliefs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::Answer::*;

    #[test]
    fn test_sensory_ties_prefer_visual_then_auditory() {
        assert_eq!(sensory_style(&[A, B, C, C, B]), LearningStyle::Auditory);
        assert_eq!(sensory_style(&[A, A, B, B, C]), LearningStyle::Visual);
        assert_eq!(sensory_style(&[C, C, C, B, A]), LearningStyle::Kinesthetic);
        assert_eq!(sensory_style(&[]), LearningStyle::Visual);
    }

    #[test]
    fn test_beliefs_levels() {
        assert_eq!(beliefs_score(&[A, A, A, A, A]), 10);
        assert_eq!(BeliefsLevel::from_score(beliefs_score(&[A, A, A, A, C])), BeliefsLevel::StrongFoundation);
        assert_eq!(BeliefsLevel::from_score(beliefs_score(&[A, A, B, C, C])), BeliefsLevel::GoodProgress);
        assert_eq!(BeliefsLevel::from_score(beliefs_score(&[A, B, B, C, C])), BeliefsLevel::GrowthOpportunity);
    }

    #[test]
    fn test_walkthrough() {
        let mut assessment = Assessment::new();
        assert_eq!(assessment.current_question().map(|q| q.title), Some("Spelling"));
        assert!(assessment.result().is_none());

        for answer in [C, C, B, C, A] {
            assessment.answer(answer).unwrap();
        }
        assert_eq!(assessment.position(), Some((Section::Beliefs, 0)));
        assert_eq!(
            assessment.current_question().map(|q| q.title),
            Some("Belief in Learning Ability")
        );

        for answer in [A, B, B, A, C] {
            assessment.answer(answer).unwrap();
        }
        assert!(assessment.is_complete());
        assert!(assessment.answer(A).is_err());

        let result = assessment.result().unwrap();
        assert_eq!(result.style, LearningStyle::Kinesthetic);
        assert_eq!(result.beliefs_score, 6);
        assert_eq!(result.beliefs_level.title(), "Good Progress");

        assessment.restart();
        assert_eq!(assessment.position(), Some((Section::Sensory, 0)));
    }
}
