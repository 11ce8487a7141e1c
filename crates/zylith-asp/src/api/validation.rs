//! Wire-to-typed conversion with labeled rejections.
//!
//! Every parse names the offending field, never its value: secrets and
//! nullifiers pass through here.

use zylith_circuits::{FreshSecrets, NoteOpening, PositionOpening};
use zylith_core::schema::ops::{FreshNote, NoteInput, PositionInput, PositionSpend};
use zylith_core::schema::pool::PoolKey;
use zylith_core::{ticks, Amount, FieldElement};

use crate::error::AspError;

fn invalid(label: &str, reason: &str) -> AspError {
    AspError::InvalidInput(format!("{label}: {reason}"))
}

/// Parse a decimal field element.
///
/// # Errors
/// [`AspError::InvalidInput`] naming `label`.
pub fn parse_field(value: &str, label: &str) -> Result<FieldElement, AspError> {
    FieldElement::from_decimal(value).map_err(|e| invalid(label, &e.to_string()))
}

/// Parse a secret or nullifier: a non-zero decimal field element.
///
/// # Errors
/// [`AspError::InvalidInput`] naming `label`.
pub fn parse_secret(value: &str, label: &str) -> Result<FieldElement, AspError> {
    let fe = parse_field(value, label)?;
    if fe.is_zero() {
        return Err(invalid(label, "must be non-zero"));
    }
    Ok(fe)
}

/// Parse a `0x`-hex address.
///
/// # Errors
/// [`AspError::InvalidInput`] naming `label`.
pub fn parse_address(value: &str, label: &str) -> Result<FieldElement, AspError> {
    FieldElement::from_hex(value).map_err(|e| invalid(label, &e.to_string()))
}

/// Parse an amount from its u128 decimal halves.
///
/// # Errors
/// [`AspError::InvalidInput`] naming `label`.
pub fn parse_amount(low: &str, high: &str, label: &str) -> Result<Amount, AspError> {
    let low = low
        .parse::<u128>()
        .map_err(|_| invalid(label, "low half is not a u128 decimal"))?;
    let high = high
        .parse::<u128>()
        .map_err(|_| invalid(label, "high half is not a u128 decimal"))?;
    Ok(Amount::from_halves(low, high))
}

/// Parse a decimal u128.
///
/// # Errors
/// [`AspError::InvalidInput`] naming `label`.
pub fn parse_u128(value: &str, label: &str) -> Result<u128, AspError> {
    value
        .parse::<u128>()
        .map_err(|_| invalid(label, "not a u128 decimal"))
}

/// Validate a pool key: both addresses parse and `token_0 < token_1`.
///
/// # Errors
/// [`AspError::InvalidInput`] on malformed addresses or bad ordering.
pub fn parse_pool_key(pool: &PoolKey) -> Result<(FieldElement, FieldElement), AspError> {
    let token0 = parse_address(&pool.token_0, "pool_key.token_0")?;
    let token1 = parse_address(&pool.token_1, "pool_key.token_1")?;
    if token0 >= token1 {
        return Err(invalid("pool_key", "token_0 must order below token_1"));
    }
    Ok((token0, token1))
}

/// Convert a wire note input into an opening.
///
/// # Errors
/// [`AspError::InvalidInput`] naming the offending sub-field.
pub fn parse_note_input(note: &NoteInput, label: &str) -> Result<NoteOpening, AspError> {
    let amount = parse_amount(
        &note.balance_low,
        &note.balance_high,
        &format!("{label}.balance"),
    )?;
    if amount.is_zero() {
        return Err(invalid(&format!("{label}.balance"), "must be positive"));
    }
    Ok(NoteOpening {
        secret: parse_secret(&note.secret, &format!("{label}.secret"))?,
        nullifier: parse_secret(&note.nullifier, &format!("{label}.nullifier"))?,
        amount,
        token: parse_address(&note.token, &format!("{label}.token"))?,
    })
}

/// Convert fresh wire secrets.
///
/// # Errors
/// [`AspError::InvalidInput`] naming the offending sub-field.
pub fn parse_fresh(note: &FreshNote, label: &str) -> Result<FreshSecrets, AspError> {
    Ok(FreshSecrets {
        secret: parse_secret(&note.secret, &format!("{label}.secret"))?,
        nullifier: parse_secret(&note.nullifier, &format!("{label}.nullifier"))?,
    })
}

/// Convert a wire position input into an opening.
///
/// # Errors
/// [`AspError::InvalidInput`] on bad secrets, liquidity or tick range.
pub fn parse_position_input(
    position: &PositionInput,
    label: &str,
) -> Result<PositionOpening, AspError> {
    let (tick_lower, tick_upper) = ticks::tick_range(position.tick_lower, position.tick_upper)
        .map_err(|e| invalid(&format!("{label}.ticks"), &e.to_string()))?;
    Ok(PositionOpening {
        secret: parse_secret(&position.secret, &format!("{label}.secret"))?,
        nullifier: parse_secret(&position.nullifier, &format!("{label}.nullifier"))?,
        tick_lower,
        tick_upper,
        liquidity: parse_u128(&position.liquidity, &format!("{label}.liquidity"))?,
    })
}

/// Convert a wire position spend into an opening plus its leaf index.
///
/// # Errors
/// [`AspError::InvalidInput`] on bad secrets, liquidity or tick range.
pub fn parse_position_spend(
    position: &PositionSpend,
    label: &str,
) -> Result<(PositionOpening, u64), AspError> {
    let input = PositionInput {
        secret: position.secret.clone(),
        nullifier: position.nullifier.clone(),
        tick_lower: position.tick_lower,
        tick_upper: position.tick_upper,
        liquidity: position.liquidity.clone(),
    };
    Ok((parse_position_input(&input, label)?, position.leaf_index))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Tests")]

    use super::*;

    #[test]
    fn labels_appear_in_messages_but_values_do_not() {
        let err = parse_secret("0", "input_note.secret").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("input_note.secret"));

        let err = parse_field("not-a-number-123456789", "input_note.nullifier").unwrap_err();
        assert!(!err.to_string().contains("not-a-number"));
    }

    #[test]
    fn pool_key_ordering() {
        let ok = PoolKey {
            token_0: "0x1".into(),
            token_1: "0x2".into(),
            fee: 3000,
            tick_spacing: 60,
        };
        assert!(parse_pool_key(&ok).is_ok());

        let swapped = PoolKey {
            token_0: "0x2".into(),
            token_1: "0x1".into(),
            fee: 3000,
            tick_spacing: 60,
        };
        assert!(parse_pool_key(&swapped).is_err());
    }

    #[test]
    fn amount_halves_parse() {
        let amount = parse_amount("5", "1", "x").unwrap();
        assert_eq!(amount.low(), 5);
        assert_eq!(amount.high(), 1);
        assert!(parse_amount("-1", "0", "x").is_err());
    }
}
