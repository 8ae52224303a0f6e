use chrono::{
    Datelike,
    NaiveDate,
};
use tracing::info;

use crate::core::LearnError;

pub const MINIMUM_AGE: u32 = 13;
pub const EARLIEST_BIRTH_YEAR: i32 = 1900;

const INVALID_BIRTH_DATE: &str = "Please enter a valid birth year and month.";

/// Where the sign-in flow stands. Restricted users keep using the free
/// features but never reach the sign-in screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthStep {
    #[default]
    AgeCheck,
    SignIn,
    Restricted,
}

/// Age in whole years, counted to the month: the birthday month itself counts.
pub fn age_in_years(year: i32, month: u32, today: NaiveDate) -> i32 {
    let age = today.year() - year;
    if today.month() < month {
        age - 1
    } else {
        age
    }
}

/// Whether someone born in `year`/`month` may sign in on `today`.
pub fn verify_age(year: i32, month: u32, today: NaiveDate) -> Result<bool, LearnError> {
    if !(EARLIEST_BIRTH_YEAR..=today.year()).contains(&year) || !(1..=12).contains(&month) {
        return Err(LearnError::Validation(INVALID_BIRTH_DATE.to_string()));
    }
    Ok(age_in_years(year, month, today) >= MINIMUM_AGE as i32)
}

/// The age screen in front of sign-in. Takes the raw text of the two inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgeCheck {
    step: AuthStep,
}

impl AgeCheck {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> AuthStep {
        self.step
    }

    pub fn is_eligible(&self) -> bool {
        self.step == AuthStep::SignIn
    }

    /// Invalid input leaves the current step unchanged.
    pub fn submit(
        &mut self,
        year: &str,
        month: &str,
        today: NaiveDate,
    ) -> Result<AuthStep, LearnError> {
        let invalid = || LearnError::Validation(INVALID_BIRTH_DATE.to_string());
        let year: i32 = year.trim().parse().map_err(|_| invalid())?;
        let month: u32 = month.trim().parse().map_err(|_| invalid())?;

        let eligible = verify_age(year, month, today)?;
        self.step = if eligible { AuthStep::SignIn } else { AuthStep::Restricted };
        info!(eligible, "age verified");
        Ok(self.step)
    }

    /// Marks a user who was verified in an earlier visit.
    pub(crate) fn mark_verified(&mut self) {
        self.step = AuthStep::SignIn;
    }
}
