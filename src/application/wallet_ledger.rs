// Wallet ledger: the stored-value account per user. Every balance change
// goes through the store's atomic adjust primitive and leaves one
// append-only ledger entry carrying the before/after pair.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::application::errors::ApiError;
use crate::core::money::Money;
use crate::core::payment::{PaymentMethod, PaymentMethodType, TransactionKind, WalletTransaction};
use crate::core::ports::{PaymentStore, StoreError};

/// How many ledger entries a summary returns, newest first.
pub const RECENT_TRANSACTIONS: u64 = 20;

#[derive(Debug, Clone)]
pub struct WalletConfig {
    pub min_top_up: Money,
    pub max_top_up: Money,
    pub currency: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            min_top_up: Money::from(5),
            max_top_up: Money::from(500),
            currency: "USD".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletSummary {
    pub balance: Money,
    pub currency: String,
    pub transactions: Vec<WalletTransaction>,
}

pub struct WalletLedger<S> {
    store: Arc<S>,
    config: WalletConfig,
}

impl<S> WalletLedger<S>
where
    S: PaymentStore + 'static,
{
    pub fn new(store: Arc<S>, config: WalletConfig) -> Self {
        Self { store, config }
    }

    /// Move funds from one of the caller's cards into their wallet.
    pub async fn top_up(
        &self,
        user_id: Uuid,
        amount: Money,
        source_method_id: Uuid,
    ) -> Result<WalletSummary, ApiError> {
        if amount < self.config.min_top_up || amount > self.config.max_top_up {
            return Err(ApiError::bad_request(format!(
                "top up amount must be between {} and {}",
                self.config.min_top_up, self.config.max_top_up
            )));
        }

        let source = self
            .store
            .get_payment_method(source_method_id)
            .await
            .map_err(|err| match err {
                StoreError::NotFound => ApiError::not_found("source payment method not found"),
                other => other.into(),
            })?;
        if source.user_id != user_id {
            return Err(ApiError::forbidden("not your payment method"));
        }
        if source.kind != PaymentMethodType::Card {
            return Err(ApiError::bad_request("can only top up from a card"));
        }

        let wallet = self.ensure_wallet(user_id).await?;
        let balance_after = self.store.adjust_wallet_balance(wallet.id, amount).await?;
        let entry = WalletTransaction {
            id: Uuid::now_v7(),
            user_id,
            payment_method_id: wallet.id,
            kind: TransactionKind::Topup,
            amount,
            balance_before: balance_after - amount,
            balance_after,
            description: "Wallet top up".to_string(),
            ride_id: None,
            external_ref: Some(source_method_id.to_string()),
            created_at: chrono::Utc::now(),
        };
        // The balance is already adjusted; a failed ledger append is an error
        // the caller must see, reconciled later via the chain.
        self.store.insert_transaction(entry).await?;

        tracing::info!(%user_id, wallet_id = %wallet.id, %amount, %balance_after, "wallet topped up");

        let transactions = self
            .store
            .recent_transactions(wallet.id, RECENT_TRANSACTIONS)
            .await?;
        Ok(WalletSummary {
            balance: balance_after,
            currency: self.currency_of(&wallet),
            transactions,
        })
    }

    /// Take up to `requested` from the wallet for a ride. Partial by design:
    /// the caller charges the remainder elsewhere. Returns the amount
    /// actually debited, zero when there is nothing to take.
    pub async fn debit_for_ride(
        &self,
        user_id: Uuid,
        ride_id: Uuid,
        requested: Money,
    ) -> Result<Money, ApiError> {
        if requested <= Money::ZERO {
            return Ok(Money::ZERO);
        }
        let Some(wallet) = self.store.find_wallet(user_id).await? else {
            return Ok(Money::ZERO);
        };
        let balance = wallet.current_balance();
        if balance <= Money::ZERO {
            return Ok(Money::ZERO);
        }

        let debit = requested.min(balance);
        let balance_after = self.store.adjust_wallet_balance(wallet.id, -debit).await?;
        let entry = WalletTransaction {
            id: Uuid::now_v7(),
            user_id,
            payment_method_id: wallet.id,
            kind: TransactionKind::Debit,
            amount: debit,
            balance_before: balance_after + debit,
            balance_after,
            description: "Ride payment from wallet".to_string(),
            ride_id: Some(ride_id),
            external_ref: None,
            created_at: chrono::Utc::now(),
        };
        self.store.insert_transaction(entry).await?;

        tracing::info!(%user_id, %ride_id, %debit, %balance_after, "wallet debited for ride");
        Ok(debit)
    }

    /// Balance plus recent ledger entries. Read-only, so it degrades instead
    /// of failing: no wallet or a balance-fetch error reads as zero, a
    /// transaction-fetch error reads as no history.
    pub async fn summary(&self, user_id: Uuid) -> Result<WalletSummary, ApiError> {
        let wallet = match self.store.find_wallet(user_id).await {
            Ok(Some(wallet)) => wallet,
            Ok(None) => return Ok(self.empty_summary()),
            Err(err) => {
                tracing::warn!(%user_id, %err, "wallet balance unavailable, degrading to zero");
                return Ok(self.empty_summary());
            }
        };
        let transactions = match self
            .store
            .recent_transactions(wallet.id, RECENT_TRANSACTIONS)
            .await
        {
            Ok(transactions) => transactions,
            Err(err) => {
                tracing::warn!(%user_id, %err, "wallet history unavailable, degrading to empty");
                Vec::new()
            }
        };
        Ok(WalletSummary {
            balance: wallet.current_balance(),
            currency: self.currency_of(&wallet),
            transactions,
        })
    }

    async fn ensure_wallet(&self, user_id: Uuid) -> Result<PaymentMethod, ApiError> {
        match self.store.find_wallet(user_id).await? {
            Some(wallet) => Ok(wallet),
            None => Ok(self
                .store
                .create_wallet(user_id, &self.config.currency)
                .await?),
        }
    }

    fn currency_of(&self, wallet: &PaymentMethod) -> String {
        wallet
            .currency
            .clone()
            .unwrap_or_else(|| self.config.currency.clone())
    }

    fn empty_summary(&self) -> WalletSummary {
        WalletSummary {
            balance: Money::ZERO,
            currency: self.config.currency.clone(),
            transactions: Vec::new(),
        }
    }
}

#[cfg(test)]
mod wallet_ledger_tests {
    use super::*;
    use crate::adapters::in_memory::in_memory_store::InMemoryStore;
    use rstest::{fixture, rstest};
    use rust_decimal_macros::dec;

    struct World {
        ledger: WalletLedger<InMemoryStore>,
        store: Arc<InMemoryStore>,
        user: Uuid,
        card: Uuid,
    }

    #[fixture]
    fn world() -> World {
        let store = Arc::new(InMemoryStore::new());
        let user = Uuid::now_v7();
        let card = store.seed_card(user);
        World {
            ledger: WalletLedger::new(store.clone(), WalletConfig::default()),
            store,
            user,
            card,
        }
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_create_the_wallet_on_first_top_up(world: World) {
        let summary = world
            .ledger
            .top_up(world.user, dec!(100.00), world.card)
            .await
            .unwrap();
        assert_eq!(summary.balance, dec!(100.00));
        assert_eq!(summary.transactions.len(), 1);
        let entry = &summary.transactions[0];
        assert_eq!(entry.kind, TransactionKind::Topup);
        assert_eq!(entry.amount, dec!(100.00));
        assert_eq!(entry.balance_before, dec!(0));
        assert_eq!(entry.balance_after, dec!(100.00));
    }

    #[rstest]
    #[case(dec!(4.99))]
    #[case(dec!(500.01))]
    #[case(dec!(0))]
    #[tokio::test]
    async fn it_should_reject_amounts_outside_the_bounds(world: World, #[case] amount: Money) {
        let err = world
            .ledger
            .top_up(world.user, amount, world.card)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)), "got {err:?}");
        assert!(world.store.find_wallet(world.user).await.unwrap().is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_reject_an_unknown_source(world: World) {
        let err = world
            .ledger
            .top_up(world.user, dec!(50.00), Uuid::now_v7())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "source payment method not found");
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_reject_someone_elses_card(world: World) {
        let other_card = world.store.seed_card(Uuid::now_v7());
        let err = world
            .ledger
            .top_up(world.user, dec!(50.00), other_card)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)), "got {err:?}");
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_reject_a_non_card_source(world: World) {
        world
            .ledger
            .top_up(world.user, dec!(50.00), world.card)
            .await
            .unwrap();
        let wallet = world.store.find_wallet(world.user).await.unwrap().unwrap();
        let err = world
            .ledger
            .top_up(world.user, dec!(50.00), wallet.id)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "can only top up from a card");
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_clip_a_debit_at_the_balance(world: World) {
        world
            .ledger
            .top_up(world.user, dec!(30.00), world.card)
            .await
            .unwrap();
        let ride = Uuid::now_v7();
        let debited = world
            .ledger
            .debit_for_ride(world.user, ride, dec!(50.00))
            .await
            .unwrap();
        assert_eq!(debited, dec!(30.00));

        let summary = world.ledger.summary(world.user).await.unwrap();
        assert_eq!(summary.balance, dec!(0));
        let entry = &summary.transactions[0];
        assert_eq!(entry.kind, TransactionKind::Debit);
        assert_eq!(entry.amount, dec!(30.00));
        assert_eq!(entry.balance_before, dec!(30.00));
        assert_eq!(entry.balance_after, dec!(0));
        assert_eq!(entry.ride_id, Some(ride));

        // Nothing left: no write, no entry.
        let again = world
            .ledger
            .debit_for_ride(world.user, ride, dec!(50.00))
            .await
            .unwrap();
        assert_eq!(again, Money::ZERO);
        assert_eq!(world.ledger.summary(world.user).await.unwrap().transactions.len(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_return_zero_without_a_wallet(world: World) {
        let debited = world
            .ledger
            .debit_for_ride(world.user, Uuid::now_v7(), dec!(10.00))
            .await
            .unwrap();
        assert_eq!(debited, Money::ZERO);

        let summary = world.ledger.summary(world.user).await.unwrap();
        assert_eq!(summary.balance, Money::ZERO);
        assert!(summary.transactions.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_degrade_the_summary_when_the_store_fails(world: World) {
        let store = Arc::new(InMemoryStore::offline());
        let ledger = WalletLedger::new(store, WalletConfig::default());
        let summary = ledger.summary(world.user).await.unwrap();
        assert_eq!(summary.balance, Money::ZERO);
        assert!(summary.transactions.is_empty());
    }
}
