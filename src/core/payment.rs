// Payment methods and the append-only wallet transaction ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::core::money::Money;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethodType {
    Card,
    Wallet,
    ApplePay,
    GooglePay,
    Paypal,
    Cash,
    BankTransfer,
    GiftCard,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: PaymentMethodType,
    // Card fields; present on card records only. The pan never reaches this
    // system, the provider token references the vaulted card.
    pub card_last4: Option<String>,
    pub card_brand: Option<String>,
    pub card_exp_month: Option<u8>,
    pub card_exp_year: Option<u16>,
    pub card_holder: Option<String>,
    pub provider_token: Option<String>,
    // Wallet fields; present on the single wallet record per user.
    pub balance: Option<Money>,
    pub currency: Option<String>,
    pub is_default: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl PaymentMethod {
    /// A fresh zero-balance wallet. Wallets are created lazily on the first
    /// operation that needs one and cannot be deactivated by the user.
    pub fn new_wallet(user_id: Uuid, currency: &str) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            kind: PaymentMethodType::Wallet,
            card_last4: None,
            card_brand: None,
            card_exp_month: None,
            card_exp_year: None,
            card_holder: None,
            provider_token: None,
            balance: Some(Money::ZERO),
            currency: Some(currency.to_string()),
            is_default: false,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn current_balance(&self) -> Money {
        self.balance.unwrap_or(Money::ZERO)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Topup,
    Debit,
    Credit,
    Refund,
}

impl TransactionKind {
    /// Ledger amounts are stored positive; the kind carries the sign.
    pub fn sign(self) -> i64 {
        match self {
            Self::Debit => -1,
            Self::Topup | Self::Credit | Self::Refund => 1,
        }
    }

    pub fn signed(self, amount: Money) -> Money {
        if self == Self::Debit { -amount } else { amount }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Topup => "topup",
            Self::Debit => "debit",
            Self::Credit => "credit",
            Self::Refund => "refund",
        };
        f.write_str(s)
    }
}

/// One append-only ledger entry. `balance_after` must equal
/// `balance_before + signed(amount)` and may never go negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub payment_method_id: Uuid,
    pub kind: TransactionKind,
    pub amount: Money,
    pub balance_before: Money,
    pub balance_after: Money,
    pub description: String,
    pub ride_id: Option<Uuid>,
    pub external_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}
