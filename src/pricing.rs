//! Cart pricing rules.
//!
//! Extras are resolved against the food item's own definitions when a line is
//! added to the cart, and the resulting unit price is stored on the line.
//! Checkout only multiplies and sums stored unit prices, so a catalog price
//! change never reaches lines or orders that already exist.

use std::collections::HashSet;

use crate::{
    error::{AppError, AppResult},
    models::Extra,
};

/// Look up each selected extra id in the food's definitions, preserving the
/// caller's order. Unknown and repeated ids are rejected.
pub fn resolve_extras(available: &[Extra], selected: &[String]) -> AppResult<Vec<Extra>> {
    let mut seen = HashSet::new();
    selected
        .iter()
        .map(|id| {
            if !seen.insert(id.as_str()) {
                return Err(AppError::BadRequest(format!("Extra {id} selected twice")));
            }
            available
                .iter()
                .find(|extra| extra.id == *id)
                .cloned()
                .ok_or_else(|| AppError::BadRequest(format!("Unknown extra {id}")))
        })
        .collect()
}

pub fn unit_price(base_price: i64, extras: &[Extra]) -> AppResult<i64> {
    extras
        .iter()
        .try_fold(base_price, |acc, extra| acc.checked_add(extra.price))
        .ok_or_else(overflow)
}

pub fn line_total(quantity: i32, unit_price: i64) -> AppResult<i64> {
    unit_price
        .checked_mul(i64::from(quantity))
        .ok_or_else(overflow)
}

/// `Σ quantity × unit_price` over `(quantity, unit_price)` pairs.
pub fn cart_total<I>(lines: I) -> AppResult<i64>
where
    I: IntoIterator<Item = (i32, i64)>,
{
    lines.into_iter().try_fold(0_i64, |acc, (quantity, price)| {
        acc.checked_add(line_total(quantity, price)?)
            .ok_or_else(overflow)
    })
}

/// Extras defined on a food item need unique non-empty ids, a name and a
/// non-negative price.
pub fn validate_extra_definitions(extras: &[Extra]) -> AppResult<()> {
    let mut ids = HashSet::new();
    for extra in extras {
        if extra.id.trim().is_empty() || extra.name.trim().is_empty() {
            return Err(AppError::BadRequest(
                "extras need a non-empty id and name".into(),
            ));
        }
        if extra.price < 0 {
            return Err(AppError::BadRequest(format!(
                "extra {} has a negative price",
                extra.id
            )));
        }
        if !ids.insert(extra.id.as_str()) {
            return Err(AppError::BadRequest(format!(
                "extra id {} is defined twice",
                extra.id
            )));
        }
    }
    Ok(())
}

fn overflow() -> AppError {
    AppError::BadRequest("amount is too large".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extra(id: &str, price: i64) -> Extra {
        Extra {
            id: id.into(),
            name: format!("Extra {id}"),
            price,
        }
    }

    #[test]
    fn burger_and_fries_total() {
        // 2x Burger at R90 and 1x Fries at R40, in cents.
        let total = cart_total([(2, 9000), (1, 4000)]).unwrap();
        assert_eq!(total, 22000);
    }

    #[test]
    fn empty_cart_sums_to_zero() {
        assert_eq!(cart_total(Vec::<(i32, i64)>::new()).unwrap(), 0);
    }

    #[test]
    fn extras_are_folded_into_the_unit_price() {
        let available = vec![extra("cheese", 1000), extra("bacon", 1500)];
        let chosen = resolve_extras(&available, &["bacon".into(), "cheese".into()]).unwrap();
        assert_eq!(chosen[0].id, "bacon");
        assert_eq!(unit_price(9000, &chosen).unwrap(), 11500);
        assert_eq!(line_total(3, 11500).unwrap(), 34500);
    }

    #[test]
    fn unknown_or_repeated_extras_are_rejected() {
        let available = vec![extra("cheese", 1000)];
        assert!(resolve_extras(&available, &["gravy".into()]).is_err());
        assert!(resolve_extras(&available, &["cheese".into(), "cheese".into()]).is_err());
        assert!(resolve_extras(&available, &[]).unwrap().is_empty());
    }

    #[test]
    fn overflow_is_a_client_error() {
        let err = cart_total([(i32::MAX, i64::MAX)]).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn extra_definitions_are_checked() {
        assert!(validate_extra_definitions(&[extra("a", 0), extra("b", 500)]).is_ok());
        assert!(validate_extra_definitions(&[extra("a", 1), extra("a", 2)]).is_err());
        assert!(validate_extra_definitions(&[extra("a", -1)]).is_err());
        assert!(validate_extra_definitions(&[extra(" ", 1)]).is_err());
    }
}
