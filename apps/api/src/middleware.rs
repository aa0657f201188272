use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use primed_core::AppError;
use subtle::ConstantTimeEq;

use crate::error::ApiResult;
use crate::state::AppState;

pub async fn require_audit_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    authorize(request.headers(), &state.audit_api_token)?;
    Ok(next.run(request).await)
}

fn authorize(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or_else(|| AppError::Unauthorized("bearer token required".to_owned()))?;

    if !bool::from(presented.as_bytes().ct_eq(expected_token.as_bytes())) {
        return Err(AppError::Unauthorized("invalid bearer token".to_owned()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue, header};
    use primed_core::AppError;

    use super::authorize;

    const TOKEN: &str = "0123456789abcdef0123456789abcdef";

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(value) {
            headers.insert(header::AUTHORIZATION, value);
        }
        headers
    }

    #[test]
    fn matching_bearer_token_is_accepted() {
        assert!(authorize(&headers(&format!("Bearer {TOKEN}")), TOKEN).is_ok());
    }

    #[test]
    fn missing_or_wrong_tokens_are_unauthorized() {
        assert!(matches!(
            authorize(&HeaderMap::new(), TOKEN),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            authorize(&headers(&format!("Basic {TOKEN}")), TOKEN),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            authorize(&headers("Bearer 0123456789abcdef0123456789abcdeX"), TOKEN),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn tokens_of_another_length_are_unauthorized() {
        assert!(matches!(
            authorize(&headers(&format!("Bearer {TOKEN}0")), TOKEN),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            authorize(&headers("Bearer 0123"), TOKEN),
            Err(AppError::Unauthorized(_))
        ));
    }
}
