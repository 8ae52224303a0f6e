use std::sync::{
    atomic::{
        AtomicU64,
        Ordering,
    },
    Mutex,
};

use async_trait::async_trait;
use chrono::{
    DateTime,
    Months,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};
use serde_json::json;
use tracing::{
    info,
    warn,
};

use super::{
    Entitlement,
    Plan,
};
use crate::{
    core::LearnError,
    remote::{
        select_as,
        Query,
        RemoteStore,
    },
};

pub const SUBSCRIPTIONS_TABLE: &str = "subscriptions";
const SUBSCRIPTION_KEY: &[&str] = &["user_id"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductId {
    AdFreeMonthly,
    AdFreeYearly,
    PremiumMonthly,
    PremiumYearly,
    FamilyMonthly,
    FamilyYearly,
}

impl ProductId {
    pub const ALL: [ProductId; 6] = [
        ProductId::AdFreeMonthly,
        ProductId::AdFreeYearly,
        ProductId::PremiumMonthly,
        ProductId::PremiumYearly,
        ProductId::FamilyMonthly,
        ProductId::FamilyYearly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProductId::AdFreeMonthly => "com.yourapp.adfree.monthly",
            ProductId::AdFreeYearly => "com.yourapp.adfree.yearly",
            ProductId::PremiumMonthly => "com.yourapp.premium.monthly",
            ProductId::PremiumYearly => "com.yourapp.premium.yearly",
            ProductId::FamilyMonthly => "com.yourapp.family.monthly",
            ProductId::FamilyYearly => "com.yourapp.family.yearly",
        }
    }

    pub fn parse(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|product| product.as_str() == id)
    }

    pub fn plan(&self) -> Plan {
        match self {
            ProductId::AdFreeMonthly | ProductId::AdFreeYearly => Plan::AdFree,
            ProductId::PremiumMonthly | ProductId::PremiumYearly => Plan::Premium,
            ProductId::FamilyMonthly | ProductId::FamilyYearly => Plan::Family,
        }
    }

    pub fn term_months(&self) -> u32 {
        match self {
            ProductId::AdFreeYearly | ProductId::PremiumYearly | ProductId::FamilyYearly => 12,
            _ => 1,
        }
    }

    pub fn expiry_from(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        start.checked_add_months(Months::new(self.term_months())).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    pub product: ProductId,
    pub purchase_token: String,
    pub purchased_at: DateTime<Utc>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self) -> Result<User, LearnError>;
    async fn current_user(&self) -> Result<Option<User>, LearnError>;
    async fn sign_out(&self) -> Result<(), LearnError>;
}

#[async_trait]
pub trait BillingProvider: Send + Sync {
    async fn purchase(&self, product: ProductId) -> Result<Purchase, LearnError>;
}

/// Signs in a fixed account without any network round trip.
#[derive(Debug)]
pub struct MockIdentity {
    account: User,
    current: Mutex<Option<User>>,
}

impl MockIdentity {
    pub fn new(account: User) -> Self {
        Self { account, current: Mutex::new(None) }
    }

    fn current(&self) -> Result<std::sync::MutexGuard<'_, Option<User>>, LearnError> {
        self.current.lock().map_err(|_| LearnError::Custom("identity lock poisoned".to_string()))
    }
}

#[async_trait]
impl IdentityProvider for MockIdentity {
    async fn sign_in(&self) -> Result<User, LearnError> {
        *self.current()? = Some(self.account.clone());
        Ok(self.account.clone())
    }

    async fn current_user(&self) -> Result<Option<User>, LearnError> {
        Ok(self.current()?.clone())
    }

    async fn sign_out(&self) -> Result<(), LearnError> {
        *self.current()? = None;
        Ok(())
    }
}

/// Approves every purchase with a sequential mock token.
#[derive(Debug, Default)]
pub struct MockBilling {
    issued: AtomicU64,
    declined: bool,
}

impl MockBilling {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declining() -> Self {
        Self { declined: true, ..Self::default() }
    }
}

#[async_trait]
impl BillingProvider for MockBilling {
    async fn purchase(&self, product: ProductId) -> Result<Purchase, LearnError> {
        if self.declined {
            return Err(LearnError::Custom("Purchase failed. Please try again.".to_string()));
        }
        let token = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(Purchase {
            product,
            purchase_token: format!("mock_token_{token}"),
            purchased_at: Utc::now(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub user_id: String,
    pub product_id: String,
    pub plan: Plan,
    pub purchase_token: String,
    pub platform: String,
    pub status: SubscriptionStatus,
    pub expires_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Subscription rows in the remote store, one per user. A new purchase
/// replaces whatever plan the user held before.
pub struct SubscriptionLedger<R: RemoteStore> {
    remote: R,
}

impl<R: RemoteStore> SubscriptionLedger<R> {
    pub fn new(remote: R) -> Self {
        Self { remote }
    }

    pub async fn record_purchase(
        &self,
        user_id: &str,
        purchase: &Purchase,
    ) -> Result<SubscriptionRecord, LearnError> {
        let record = SubscriptionRecord {
            user_id: user_id.to_string(),
            product_id: purchase.product.as_str().to_string(),
            plan: purchase.product.plan(),
            purchase_token: purchase.purchase_token.clone(),
            platform: "android".to_string(),
            status: SubscriptionStatus::Active,
            expires_at: purchase.product.expiry_from(purchase.purchased_at),
            updated_at: purchase.purchased_at,
        };
        self.remote
            .upsert(SUBSCRIPTIONS_TABLE, SUBSCRIPTION_KEY, serde_json::to_value(&record)?)
            .await?;
        info!(user = user_id, plan = %record.plan, expires_at = %record.expires_at, "subscription recorded");
        Ok(record)
    }

    /// The user's active subscription if it is still in date, else free.
    pub async fn active_entitlement(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Entitlement, LearnError> {
        let query = Query::from(SUBSCRIPTIONS_TABLE)
            .eq("user_id", user_id)
            .eq("status", "active")
            .gt("expires_at", serde_json::to_value(now)?)
            .order_by("expires_at", false)
            .limit(1);
        let records: Vec<SubscriptionRecord> = select_as(&self.remote, &query).await?;
        Ok(records
            .into_iter()
            .next()
            .map(|record| Entitlement::new(record.plan, record.expires_at))
            .unwrap_or_default())
    }

    pub async fn cancel(&self, user_id: &str, product: ProductId) -> Result<usize, LearnError> {
        let query = Query::from(SUBSCRIPTIONS_TABLE)
            .eq("user_id", user_id)
            .eq("product_id", product.as_str());
        let patch = json!({ "status": SubscriptionStatus::Cancelled, "updated_at": Utc::now() });
        let changed = self.remote.update_where(&query, patch).await?;
        if changed == 0 {
            warn!(user = user_id, product = product.as_str(), "no subscription to cancel");
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{
        Duration,
        TimeZone,
    };

    use super::*;
    use crate::remote::MemoryRemote;

    fn purchase(product: ProductId, at: DateTime<Utc>) -> Purchase {
        Purchase { product, purchase_token: "tok".to_string(), purchased_at: at }
    }

    #[test]
    fn test_product_mapping() {
        for product in ProductId::ALL {
            assert_eq!(ProductId::parse(product.as_str()), Some(product));
        }
        assert_eq!(ProductId::parse("com.yourapp.gold"), None);
        assert_eq!(ProductId::FamilyYearly.plan(), Plan::Family);

        let start = Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap();
        assert_eq!(
            ProductId::PremiumMonthly.expiry_from(start),
            Utc.with_ymd_and_hms(2024, 2, 29, 12, 0, 0).unwrap()
        );
        assert_eq!(
            ProductId::AdFreeYearly.expiry_from(start),
            Utc.with_ymd_and_hms(2025, 1, 31, 12, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_latest_purchase_replaces_previous_plan() {
        let remote = std::sync::Arc::new(MemoryRemote::new());
        let ledger = SubscriptionLedger::new(remote.clone());
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        assert_eq!(ledger.active_entitlement("u1", now).await.unwrap(), Entitlement::free());

        ledger
            .record_purchase("u1", &purchase(ProductId::AdFreeYearly, now - Duration::days(10)))
            .await
            .unwrap();
        assert_eq!(ledger.active_entitlement("u1", now).await.unwrap().plan, Plan::AdFree);

        // a shorter premium term still wins over the longer ad-free one
        ledger
            .record_purchase("u1", &purchase(ProductId::PremiumMonthly, now - Duration::days(1)))
            .await
            .unwrap();
        let entitlement = ledger.active_entitlement("u1", now).await.unwrap();
        assert_eq!(entitlement.plan, Plan::Premium);
        assert_eq!(entitlement.plan_at(now), Plan::Premium);

        let rows = remote
            .select(&Query::from(SUBSCRIPTIONS_TABLE).eq("user_id", "u1"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);

        ledger
            .record_purchase("u2", &purchase(ProductId::FamilyYearly, now))
            .await
            .unwrap();
        assert_eq!(ledger.active_entitlement("u1", now).await.unwrap().plan, Plan::Premium);
        assert_eq!(ledger.active_entitlement("u2", now).await.unwrap().plan, Plan::Family);
    }

    #[tokio::test]
    async fn test_expired_and_cancelled_subscriptions_read_as_free() {
        let ledger = SubscriptionLedger::new(MemoryRemote::new());
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        ledger
            .record_purchase("u1", &purchase(ProductId::PremiumMonthly, now - Duration::days(40)))
            .await
            .unwrap();
        assert_eq!(ledger.active_entitlement("u1", now).await.unwrap(), Entitlement::free());

        ledger
            .record_purchase("u1", &purchase(ProductId::AdFreeYearly, now - Duration::days(1)))
            .await
            .unwrap();
        assert_eq!(ledger.cancel("u1", ProductId::PremiumMonthly).await.unwrap(), 0);
        assert_eq!(ledger.active_entitlement("u1", now).await.unwrap().plan, Plan::AdFree);

        assert_eq!(ledger.cancel("u1", ProductId::AdFreeYearly).await.unwrap(), 1);
        assert_eq!(ledger.active_entitlement("u1", now).await.unwrap(), Entitlement::free());
    }

    #[tokio::test]
    async fn test_mocks() {
        let identity = MockIdentity::new(User {
            id: "u1".to_string(),
            email: "student@example.com".to_string(),
            name: None,
        });
        assert_eq!(identity.current_user().await.unwrap(), None);
        let user = identity.sign_in().await.unwrap();
        assert_eq!(identity.current_user().await.unwrap(), Some(user));
        identity.sign_out().await.unwrap();
        assert_eq!(identity.current_user().await.unwrap(), None);

        let billing = MockBilling::new();
        let first = billing.purchase(ProductId::PremiumMonthly).await.unwrap();
        let second = billing.purchase(ProductId::PremiumMonthly).await.unwrap();
        assert_ne!(first.purchase_token, second.purchase_token);
        assert!(MockBilling::declining().purchase(ProductId::PremiumMonthly).await.is_err());
    }
}
