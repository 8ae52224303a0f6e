//! Subscription plans and the access checks that guard premium screens.

use std::fmt;

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};
use tracing::info;

use crate::core::{
    LearnError,
    Notice,
};

pub mod age;
pub mod billing;
pub mod session;

pub use age::{
    verify_age,
    AgeCheck,
    AuthStep,
    MINIMUM_AGE,
};
pub use billing::{
    BillingProvider,
    IdentityProvider,
    MockBilling,
    MockIdentity,
    ProductId,
    Purchase,
    SubscriptionLedger,
    SubscriptionRecord,
    SubscriptionStatus,
    User,
};
pub use session::Session;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Plan {
    #[default]
    Free,
    AdFree,
    Premium,
    Family,
}

impl Plan {
    /// Position in the upgrade ladder.
    pub fn rank(&self) -> u8 {
        match self {
            Plan::Free => 0,
            Plan::AdFree => 1,
            Plan::Premium => 2,
            Plan::Family => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::AdFree => "ad-free",
            Plan::Premium => "premium",
            Plan::Family => "family",
        }
    }

    pub fn shows_ads(&self) -> bool {
        *self == Plan::Free
    }

    pub fn grants(&self, tier: Tier) -> bool {
        match tier {
            Tier::Free => true,
            Tier::Premium => matches!(self, Plan::Premium | Plan::Family),
        }
    }

    pub fn benefits(&self) -> &'static [&'static str] {
        match self {
            Plan::Free => &[],
            Plan::AdFree => &["Remove all ads", "Uninterrupted learning"],
            Plan::Premium => &["Access all premium content", "Advanced features", "No ads"],
            Plan::Family => &["Share with up to 4 users", "All premium features", "Family management"],
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Free,
    Premium,
}

impl Tier {
    /// Cheapest plan that opens this tier.
    pub fn minimum_plan(&self) -> Plan {
        match self {
            Tier::Free => Plan::Free,
            Tier::Premium => Plan::Premium,
        }
    }
}

/// A plan and, for paid plans, when it lapses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entitlement {
    pub plan: Plan,
    pub valid_until: Option<DateTime<Utc>>,
}

impl Entitlement {
    pub fn free() -> Self {
        Self::default()
    }

    pub fn new(plan: Plan, valid_until: DateTime<Utc>) -> Self {
        Self { plan, valid_until: Some(valid_until) }
    }

    /// The plan in force at `now`; anything expired counts as free.
    pub fn plan_at(&self, now: DateTime<Utc>) -> Plan {
        match self.valid_until {
            Some(until) if until <= now => Plan::Free,
            _ => self.plan,
        }
    }
}

pub trait EntitlementOracle {
    fn plan(&self) -> Plan;

    fn is_signed_in(&self) -> bool;

    fn has_access(&self, tier: Tier) -> bool {
        self.plan().grants(tier)
    }

    fn shows_ads(&self) -> bool {
        self.plan().shows_ads()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Assessment,
    BeliefsJournal,
    GoalSetting,
    RevisionCycle,
    WordBuilder,
    VirtualReading,
    SpellingGame,
    VocabJournal,
    HomeworkDiary,
}

impl Feature {
    pub fn tier(&self) -> Tier {
        match self {
            Feature::Assessment | Feature::BeliefsJournal | Feature::GoalSetting => Tier::Premium,
            _ => Tier::Free,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Feature::Assessment => "Learning Assessment",
            Feature::BeliefsJournal => "My Beliefs",
            Feature::GoalSetting => "My Goals",
            Feature::RevisionCycle => "Revision Planner",
            Feature::WordBuilder => "Word Builder",
            Feature::VirtualReading => "Virtual Reading Builder",
            Feature::SpellingGame => "Spelling Challenge",
            Feature::VocabJournal => "My Vocab Journal",
            Feature::HomeworkDiary => "Homework Diary",
        }
    }
}

/// Why a gated screen stayed closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpgradePrompt {
    SignIn { feature: Feature },
    Upgrade { feature: Feature, current: Plan, required: Plan },
}

impl UpgradePrompt {
    pub fn feature(&self) -> Feature {
        match self {
            UpgradePrompt::SignIn { feature } | UpgradePrompt::Upgrade { feature, .. } => *feature,
        }
    }

    pub fn benefits(&self) -> &'static [&'static str] {
        match self {
            UpgradePrompt::SignIn { .. } => &[],
            UpgradePrompt::Upgrade { required, .. } => required.benefits(),
        }
    }
}

impl From<UpgradePrompt> for LearnError {
    fn from(prompt: UpgradePrompt) -> Self {
        match prompt {
            UpgradePrompt::SignIn { feature } => LearnError::SignInRequired(feature.title().to_string()),
            UpgradePrompt::Upgrade { feature, required, .. } => LearnError::AccessDenied {
                feature: feature.title().to_string(),
                required: required.to_string(),
            },
        }
    }
}

impl From<UpgradePrompt> for Notice {
    fn from(prompt: UpgradePrompt) -> Self {
        Notice::from(LearnError::from(prompt))
    }
}

/// Access check in front of one screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gate {
    feature: Feature,
}

impl Gate {
    pub fn new(feature: Feature) -> Self {
        Self { feature }
    }

    pub fn feature(&self) -> Feature {
        self.feature
    }

    /// Premium screens need a signed-in user first, then a qualifying plan.
    pub fn check<O: EntitlementOracle + ?Sized>(&self, oracle: &O) -> Result<(), UpgradePrompt> {
        let tier = self.feature.tier();
        if tier == Tier::Free {
            return Ok(());
        }
        if !oracle.is_signed_in() {
            return Err(UpgradePrompt::SignIn { feature: self.feature });
        }
        if !oracle.has_access(tier) {
            return Err(UpgradePrompt::Upgrade {
                feature: self.feature,
                current: oracle.plan(),
                required: tier.minimum_plan(),
            });
        }
        Ok(())
    }

    /// Runs `render` only when the check passes.
    pub fn mount<O, T, F>(&self, oracle: &O, render: F) -> Result<T, UpgradePrompt>
    where
        O: EntitlementOracle + ?Sized,
        F: FnOnce() -> T,
    {
        match self.check(oracle) {
            Ok(()) => Ok(render()),
            Err(prompt) => {
                info!(feature = ?self.feature, ?prompt, "gated screen not mounted");
                Err(prompt)
            }
        }
    }
}
