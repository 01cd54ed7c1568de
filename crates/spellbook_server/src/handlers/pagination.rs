//! `limit` / `offset` normalization for list requests.

use crate::models::ListQuery;
use crate::{AppError, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};

/// Parse a query value as an integer; integral-looking floats are truncated.
///
/// Returns `Err(())` for anything non-numeric, `Ok(None)` when absent or blank.
fn parse_number(raw: Option<&str>) -> Result<Option<i64>, ()> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    if let Ok(value) = raw.parse::<i64>() {
        return Ok(Some(value));
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value.trunc() as i64)),
        _ => Err(()),
    }
}

/// Resolve the effective `(limit, offset)` for a list request.
///
/// `limit` defaults to [`DEFAULT_LIST_LIMIT`] and is clamped to
/// `1..=MAX_LIST_LIMIT`; `offset` defaults to 0 and negative values floor at 0.
///
/// # Errors
/// Returns a validation error naming each non-numeric parameter.
pub(crate) fn page_params(query: &ListQuery) -> Result<(usize, usize), AppError> {
    let mut errors = Vec::new();

    let limit = match parse_number(query.limit.as_deref()) {
        Ok(Some(value)) => value.clamp(1, MAX_LIST_LIMIT as i64) as usize,
        Ok(None) => DEFAULT_LIST_LIMIT,
        Err(()) => {
            errors.push("limit must be a number".to_string());
            DEFAULT_LIST_LIMIT
        }
    };
    let offset = match parse_number(query.offset.as_deref()) {
        Ok(Some(value)) => value.max(0) as usize,
        Ok(None) => 0,
        Err(()) => {
            errors.push("offset must be a number".to_string());
            0
        }
    };

    if errors.is_empty() {
        Ok((limit, offset))
    } else {
        Err(AppError::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(limit: Option<&str>, offset: Option<&str>) -> ListQuery {
        ListQuery {
            limit: limit.map(str::to_string),
            offset: offset.map(str::to_string),
        }
    }

    #[test]
    fn defaults_apply_when_params_are_missing_or_blank() {
        assert_eq!(page_params(&query(None, None)).unwrap(), (DEFAULT_LIST_LIMIT, 0));
        assert_eq!(
            page_params(&query(Some(" "), Some(""))).unwrap(),
            (DEFAULT_LIST_LIMIT, 0)
        );
    }

    #[test]
    fn limit_is_clamped_and_offset_floored() {
        let cases = [
            ((Some("0"), Some("-4")), (1, 0)),
            ((Some("5000"), Some("10")), (MAX_LIST_LIMIT, 10)),
            ((Some("7.9"), Some("3.2")), (7, 3)),
            ((Some("-3"), None), (1, 0)),
        ];
        for ((limit, offset), expected) in cases {
            assert_eq!(page_params(&query(limit, offset)).unwrap(), expected);
        }
    }

    #[test]
    fn non_numeric_values_are_rejected_together() {
        let err = page_params(&query(Some("ten"), Some("abc"))).expect_err("invalid");
        assert_eq!(err.to_string(), "limit must be a number; offset must be a number");

        let err = page_params(&query(Some("NaN"), None)).expect_err("nan");
        assert_eq!(err.to_string(), "limit must be a number");
    }
}
