//! Spelling challenge: a word is shown for a few seconds, then hidden and
//! typed back from memory.

use rand::{
    seq::SliceRandom,
    Rng,
};
use tracing::{
    debug,
    info,
};

use crate::settings::GameSettings;

pub mod timer;

pub use timer::{
    run_reveal,
    Countdown,
};

pub const MAX_LEVEL: u8 = 4;
pub const MAX_ROUND_SIZE: usize = 5;

const WORD_LISTS: [&[&str]; 4] = [
    &["Math", "Spell", "Done", "Ever", "Note"],
    &["House", "Plane", "Store", "Bread", "Track"],
    &["planet", "window", "school", "picture"],
    &["Happiness", "Lawyer", "dictionary", "adventure", "celebration"],
];

pub fn word_pool(level: u8) -> Option<&'static [&'static str]> {
    WORD_LISTS.get(usize::from(level).checked_sub(1)?).copied()
}

pub fn level_name(level: u8) -> &'static str {
    match level {
        1 => "Level 1: Easy (4-letter words)",
        2 => "Level 2: Medium (5-letter words)",
        3 => "Level 3: Hard (6-letter words)",
        _ => "Level 4: Challenge Mode (7+ letters)",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Single,
    TwoPlayer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Player {
    One,
    Two,
}

impl Player {
    pub fn other(self) -> Self {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    fn index(self) -> usize {
        match self {
            Player::One => 0,
            Player::Two => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Revealing { remaining: u32 },
    AwaitingInput,
    Judged { correct: bool },
    RoundComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    Single { score: u32, out_of: usize },
    TwoPlayer { one: u32, two: u32, winner: Option<Player> },
}

#[derive(Debug, Clone)]
pub struct SpellingGame {
    mode: Mode,
    rules: GameSettings,
    level: u8,
    words: Vec<&'static str>,
    index: usize,
    phase: Phase,
    scores: [u32; 2],
    current: Player,
}

impl SpellingGame {
    pub fn new(mode: Mode, rules: &GameSettings) -> Self {
        Self {
            mode,
            rules: rules.clone(),
            level: 1,
            words: Vec::new(),
            index: 0,
            phase: Phase::Idle,
            scores: [0, 0],
            current: Player::One,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn current_player(&self) -> Player {
        self.current
    }

    pub fn words(&self) -> &[&'static str] {
        &self.words
    }

    /// Position of the active word as (1-based index, round length).
    pub fn position(&self) -> (usize, usize) {
        (self.index + 1, self.words.len())
    }

    /// The word on screen: shown while revealing and again after judging.
    pub fn visible_word(&self) -> Option<&'static str> {
        match self.phase {
            Phase::Revealing { .. } | Phase::Judged { .. } => self.words.get(self.index).copied(),
            _ => None,
        }
    }

    pub fn score(&self, player: Player) -> u32 {
        self.scores[player.index()]
    }

    /// Picks up to `round_size` distinct words from the level pool and starts
    /// revealing the first.
    pub fn start_round<R: Rng + ?Sized>(&mut self, rng: &mut R) -> &'static str {
        let pool = word_pool(self.level).unwrap_or(WORD_LISTS[0]);
        let mut words = pool.to_vec();
        words.shuffle(rng);
        words.truncate(self.rules.round_size.clamp(1, MAX_ROUND_SIZE));

        self.words = words;
        self.index = 0;
        self.scores = [0, 0];
        self.current = Player::One;
        self.begin_reveal();
        info!(level = self.level, words = self.words.len(), "spelling round started");
        self.words.first().copied().unwrap_or_default()
    }

    fn begin_reveal(&mut self) {
        self.phase = if self.rules.reveal_seconds == 0 {
            Phase::AwaitingInput
        } else {
            Phase::Revealing { remaining: self.rules.reveal_seconds }
        };
    }

    /// One second of reveal countdown. Hides the word when it hits zero.
    pub fn tick(&mut self) -> Phase {
        if let Phase::Revealing { remaining } = self.phase {
            let remaining = remaining.saturating_sub(1);
            self.phase = if remaining == 0 {
                Phase::AwaitingInput
            } else {
                Phase::Revealing { remaining }
            };
        }
        self.phase
    }

    /// Judges an answer. Input outside the answer phase is ignored (`None`).
    pub fn submit(&mut self, answer: &str) -> Option<bool> {
        if self.phase != Phase::AwaitingInput {
            debug!(phase = ?self.phase, "answer ignored");
            return None;
        }
        let target = self.words.get(self.index)?;
        let correct = answer.to_lowercase() == target.to_lowercase();
        if correct {
            let scorer = match self.mode {
                Mode::Single => Player::One,
                Mode::TwoPlayer => self.current,
            };
            self.scores[scorer.index()] += 1;
        }
        self.phase = Phase::Judged { correct };
        Some(correct)
    }

    /// Moves on from a judged word, handing the turn over in two-player mode.
    pub fn next(&mut self) -> Phase {
        if !matches!(self.phase, Phase::Judged { .. }) {
            return self.phase;
        }
        if self.index + 1 < self.words.len() {
            self.index += 1;
            if self.mode == Mode::TwoPlayer {
                self.current = self.current.other();
            }
            self.begin_reveal();
        } else {
            self.phase = Phase::RoundComplete;
            info!(outcome = ?self.outcome(), "spelling round complete");
        }
        self.phase
    }

    pub fn outcome(&self) -> RoundOutcome {
        match self.mode {
            Mode::Single => {
                RoundOutcome::Single { score: self.scores[0], out_of: self.words.len() }
            }
            Mode::TwoPlayer => {
                let (one, two) = (self.scores[0], self.scores[1]);
                let winner = match one.cmp(&two) {
                    std::cmp::Ordering::Greater => Some(Player::One),
                    std::cmp::Ordering::Less => Some(Player::Two),
                    std::cmp::Ordering::Equal => None,
                };
                RoundOutcome::TwoPlayer { one, two, winner }
            }
        }
    }

    /// Single-player rounds that reach the unlock score open the next level.
    pub fn next_level_unlocked(&self) -> bool {
        self.phase == Phase::RoundComplete
            && self.mode == Mode::Single
            && self.scores[0] >= self.rules.unlock_score
            && self.level < MAX_LEVEL
    }

    pub fn advance_level(&mut self) -> bool {
        if !self.next_level_unlocked() {
            return false;
        }
        self.level += 1;
        self.phase = Phase::Idle;
        true
    }

    pub fn play_again(&mut self) {
        self.phase = Phase::Idle;
    }
}
