// Money is an exact decimal. Arithmetic inside the core never rounds;
// presentation rounds to two fractional digits at the edge.

use rust_decimal::RoundingStrategy;

pub type Money = rust_decimal::Decimal;

/// Round for presentation. Ledger and dispute arithmetic keep full precision.
pub fn to_cents(amount: Money) -> Money {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
