use crate::domain::order::{PaymentOutcome, PaymentRedirect};
use crate::error::{Result, StorefrontError};
use url::Url;

/// Parses the payment provider's return URL:
/// `/payment/{success|fail}?orderId=...&paymentKey=...`.
///
/// Accepts a full URL or a path-with-query fragment. A missing outcome tag
/// or order id is an invalid request: the caller must not touch the store.
/// The transaction key is only meaningful on the success path and is dropped
/// otherwise.
pub fn parse_return_url(input: &str) -> Result<PaymentRedirect> {
    let trimmed = input.trim();
    let url = if trimmed.contains("://") {
        Url::parse(trimmed).map_err(|_| StorefrontError::InvalidRedirect)?
    } else {
        let path = trimmed.strip_prefix('/').unwrap_or(trimmed);
        Url::parse(&format!("http://localhost/{path}"))
            .map_err(|_| StorefrontError::InvalidRedirect)?
    };

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|p| !p.is_empty()).collect())
        .unwrap_or_default();
    let outcome = match segments.as_slice() {
        [.., "payment", "success"] => PaymentOutcome::Success,
        [.., "payment", "fail"] => PaymentOutcome::Fail,
        _ => return Err(StorefrontError::InvalidRedirect),
    };

    let mut order_id = None;
    let mut payment_key = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "orderId" if !value.is_empty() => order_id = Some(value.into_owned()),
            "paymentKey" if !value.is_empty() => payment_key = Some(value.into_owned()),
            _ => {}
        }
    }

    let order_id = order_id.ok_or(StorefrontError::InvalidRedirect)?;
    Ok(PaymentRedirect {
        outcome,
        order_id,
        payment_key: match outcome {
            PaymentOutcome::Success => payment_key,
            PaymentOutcome::Fail => None,
        },
    })
}
