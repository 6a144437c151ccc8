//! Broker repository and client traits.
//!
//! These traits define the contracts for the cached position store, the
//! broker account store, and the broker refresh client without any
//! transport- or database-specific types.

use async_trait::async_trait;

use super::broker_model::{BrokerAccount, CachedHolding, CachedPosition};
use crate::errors::Result;

/// Trait defining read access to the cached position store.
///
/// The store holds the latest broker-synced rows per user. It is multi-reader
/// always; writes happen only on the locked refresh path, one writer per
/// account.
pub trait PositionStoreTrait: Send + Sync {
    /// All cached holdings for a user, across every linked account.
    fn holdings_for_user(&self, user_id: &str) -> Result<Vec<CachedHolding>>;

    /// All cached open positions for a user, across every linked account.
    fn positions_for_user(&self, user_id: &str) -> Result<Vec<CachedPosition>>;
}

/// Trait defining the contract for broker account lookups.
pub trait BrokerAccountRepositoryTrait: Send + Sync {
    /// Retrieves an account by its ID.
    fn get_by_id(&self, account_id: &str) -> Result<BrokerAccount>;

    /// Active accounts for a user, in refresh iteration order.
    fn active_accounts_for_user(&self, user_id: &str) -> Result<Vec<BrokerAccount>>;
}

/// Trait defining the broker refresh client.
///
/// Implementations authenticate against the broker API, pull fresh holdings
/// and positions, and overwrite the account's cached rows. Timeouts and
/// per-call retry policy are the implementation's concern; callers only see
/// the final `Result`.
#[async_trait]
pub trait BrokerClientTrait: Send + Sync {
    async fn refresh_account(&self, account: &BrokerAccount) -> Result<()>;
}
