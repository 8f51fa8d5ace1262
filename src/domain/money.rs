use rust_decimal::Decimal;

/// Decimal places every ledger amount carries.
pub const SCALE: u32 = 2;

/// Bring an amount to exactly [`SCALE`] places, banker's rounding at the
/// midpoint. All amounts are normalized once, at the boundary where they
/// enter the ledger; arithmetic further in never re-rounds.
pub fn normalize(amount: Decimal) -> Decimal {
    let mut normalized = amount.round_dp(SCALE);
    normalized.rescale(SCALE);
    normalized
}

/// Parse an amount from its wire form. `None` means the text is not a
/// decimal number at all; range checks belong to the caller.
pub fn parse(raw: &str) -> Option<Decimal> {
    raw.trim().parse().ok().map(normalize)
}
