use chrono::{
    NaiveDate,
    Utc,
};
use tracing::{
    info,
    warn,
};

use super::{
    AgeCheck,
    AuthStep,
    BillingProvider,
    Entitlement,
    EntitlementOracle,
    Feature,
    Gate,
    IdentityProvider,
    MINIMUM_AGE,
    Plan,
    ProductId,
    SubscriptionLedger,
    UpgradePrompt,
    User,
};
use crate::{
    core::LearnError,
    remote::RemoteStore,
};

/// The signed-in user and what they are entitled to. Screens receive this
/// explicitly instead of reading global auth state.
pub struct Session<I, B, R>
where
    I: IdentityProvider,
    B: BillingProvider,
    R: RemoteStore,
{
    identity: I,
    billing: B,
    ledger: SubscriptionLedger<R>,
    user: Option<User>,
    entitlement: Entitlement,
    age: AgeCheck,
}

impl<I, B, R> Session<I, B, R>
where
    I: IdentityProvider,
    B: BillingProvider,
    R: RemoteStore,
{
    pub fn new(identity: I, billing: B, remote: R) -> Self {
        Self {
            identity,
            billing,
            ledger: SubscriptionLedger::new(remote),
            user: None,
            entitlement: Entitlement::free(),
            age: AgeCheck::new(),
        }
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn entitlement(&self) -> Entitlement {
        self.entitlement
    }

    pub fn ledger(&self) -> &SubscriptionLedger<R> {
        &self.ledger
    }

    pub fn auth_step(&self) -> AuthStep {
        self.age.step()
    }

    /// Runs the age check that sits in front of sign-in.
    pub fn verify_age(
        &mut self,
        year: &str,
        month: &str,
        today: NaiveDate,
    ) -> Result<AuthStep, LearnError> {
        self.age.submit(year, month, today)
    }

    /// Picks up an existing sign-in, if the identity provider remembers one.
    pub async fn restore(&mut self) -> Result<Option<&User>, LearnError> {
        self.user = self.identity.current_user().await?;
        if self.user.is_some() {
            self.age.mark_verified();
        }
        self.refresh().await;
        Ok(self.user.as_ref())
    }

    pub async fn sign_in(&mut self) -> Result<&User, LearnError> {
        match self.age.step() {
            AuthStep::SignIn => {}
            AuthStep::Restricted => return Err(LearnError::AgeRestricted(MINIMUM_AGE)),
            AuthStep::AgeCheck => {
                return Err(LearnError::Validation(
                    "Please verify your age before signing in".to_string(),
                ));
            }
        }
        let user = self.identity.sign_in().await?;
        info!(user = %user.id, "signed in");
        let user = self.user.insert(user);
        let now = Utc::now();
        self.entitlement = match self.ledger.active_entitlement(&user.id, now).await {
            Ok(entitlement) => entitlement,
            Err(e) => {
                warn!("Failed to fetch subscription plan: {}", e);
                Entitlement::free()
            }
        };
        Ok(&*user)
    }

    pub async fn sign_out(&mut self) -> Result<(), LearnError> {
        self.identity.sign_out().await?;
        if let Some(user) = self.user.take() {
            info!(user = %user.id, "signed out");
        }
        self.entitlement = Entitlement::free();
        Ok(())
    }

    /// Re-reads the entitlement. Lookup failures fall back to free.
    pub async fn refresh(&mut self) -> Entitlement {
        self.entitlement = match &self.user {
            None => Entitlement::free(),
            Some(user) => match self.ledger.active_entitlement(&user.id, Utc::now()).await {
                Ok(entitlement) => entitlement,
                Err(e) => {
                    warn!(user = %user.id, "Failed to fetch subscription plan: {}", e);
                    Entitlement::free()
                }
            },
        };
        self.entitlement
    }

    pub async fn purchase(&mut self, product: ProductId) -> Result<Entitlement, LearnError> {
        let user_id = self
            .user
            .as_ref()
            .map(|user| user.id.clone())
            .ok_or_else(|| LearnError::SignInRequired("subscriptions".to_string()))?;

        let purchase = self.billing.purchase(product).await?;
        self.ledger.record_purchase(&user_id, &purchase).await?;
        Ok(self.refresh().await)
    }

    pub async fn cancel(&mut self, product: ProductId) -> Result<Entitlement, LearnError> {
        let user_id = self
            .user
            .as_ref()
            .map(|user| user.id.clone())
            .ok_or_else(|| LearnError::SignInRequired("subscriptions".to_string()))?;

        self.ledger.cancel(&user_id, product).await?;
        Ok(self.refresh().await)
    }

    pub fn gate<T>(&self, feature: Feature, render: impl FnOnce() -> T) -> Result<T, UpgradePrompt> {
        Gate::new(feature).mount(self, render)
    }
}

impl<I, B, R> EntitlementOracle for Session<I, B, R>
where
    I: IdentityProvider,
    B: BillingProvider,
    R: RemoteStore,
{
    fn plan(&self) -> Plan {
        if self.user.is_none() {
            return Plan::Free;
        }
        self.entitlement.plan_at(Utc::now())
    }

    fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }
}
