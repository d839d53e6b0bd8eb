//! HTTP failure classification.

use crate::ApiErrorBody;
use fabula_error::ServiceErrorKind;

/// Classify a non-success HTTP status and its body.
///
/// | Status            | Kind                                   |
/// |-------------------|----------------------------------------|
/// | 408, 504          | `Timeout`                              |
/// | 429               | `RateLimited`, or `QuotaExhausted` when the body reports `insufficient_quota` |
/// | 500, 502, 503     | `Unavailable`                          |
/// | 400, 404, 413, 422| `InvalidInput`                         |
/// | 401, 403          | `Unauthorized`                         |
///
/// Other 5xx statuses are treated as unavailable; other 4xx as invalid input.
///
/// # Examples
///
/// ```
/// use fabula_error::ServiceErrorKind;
/// use fabula_models::classify_status;
///
/// let kind = classify_status(429, r#"{"error":{"message":"quota","type":"insufficient_quota"}}"#);
/// assert!(matches!(kind, ServiceErrorKind::QuotaExhausted(_)));
/// assert!(classify_status(503, "").is_transient());
/// ```
pub fn classify_status(status: u16, body: &str) -> ServiceErrorKind {
    let parsed = serde_json::from_str::<ApiErrorBody>(body).ok();
    let message = parsed
        .as_ref()
        .map(|b| b.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| truncate(body, 200));
    let detail = format!("HTTP {}: {}", status, message);

    let quota_exhausted = parsed.as_ref().is_some_and(|b| {
        b.error.kind.as_deref() == Some("insufficient_quota")
            || b.error
                .code
                .as_ref()
                .and_then(|c| c.as_str())
                .is_some_and(|c| c == "insufficient_quota")
    }) || body.contains("insufficient_quota");

    match status {
        408 | 504 => ServiceErrorKind::Timeout(detail),
        429 if quota_exhausted => ServiceErrorKind::QuotaExhausted(detail),
        429 => ServiceErrorKind::RateLimited(detail),
        401 | 403 => ServiceErrorKind::Unauthorized(detail),
        500..=599 => ServiceErrorKind::Unavailable(detail),
        _ => ServiceErrorKind::InvalidInput(detail),
    }
}

/// Classify a transport-level failure.
pub fn classify_transport(err: &reqwest::Error) -> ServiceErrorKind {
    if err.is_timeout() {
        ServiceErrorKind::Timeout(err.to_string())
    } else if err.is_decode() || err.is_body() {
        ServiceErrorKind::MalformedResponse(err.to_string())
    } else {
        ServiceErrorKind::Unavailable(err.to_string())
    }
}

fn truncate(body: &str, max_chars: usize) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= max_chars {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
