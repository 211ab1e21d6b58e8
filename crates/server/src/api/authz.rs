use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use iam_core::{AccessRequest, AuthzResponse, AuditRecord, Effect};

use crate::AppState;
use crate::error::ServerError;

/// `POST /v1/authz` — the decision frontend (C6).
///
/// Resolves the principal from the `Authorization: Bearer <username>`
/// header (a stand-in for the JWT verification this server treats as an
/// external collaborator), invokes the policy evaluator, records an audit
/// entry, and returns the decision. Audit enqueue failure never reaches the
/// caller — failures inside the pipeline are logged and dropped there.
#[utoipa::path(
    post,
    path = "/v1/authz",
    tag = "Authorization",
    request_body = AccessRequest,
    responses(
        (status = 200, description = "A decision was produced", body = AuthzResponse),
        (status = 400, description = "Malformed request body"),
        (status = 401, description = "No principal could be resolved"),
    )
)]
pub async fn authorize(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(mut request): Json<AccessRequest>,
) -> Result<Json<AuthzResponse>, ServerError> {
    let username = resolve_principal(&headers)?;
    request
        .context
        .insert("username".to_owned(), serde_json::json!(username));

    let snapshot = state.store.current();
    let response = state.evaluator.authorize(&request, &snapshot);

    let record = AuditRecord::new(
        Utc::now(),
        username,
        if response.allowed { Effect::Allow } else { Effect::Deny },
        response.reason.clone(),
        serde_json::to_value(&request).unwrap_or(serde_json::Value::Null),
        serde_json::json!(response.matched_policies),
        serde_json::json!(response.deciders),
        Duration::zero(),
    );
    state.audit.record_hit(record).await;

    Ok(Json(response))
}

/// Extract the bearer token and treat it as the authenticated username.
/// Real JWT verification is an external collaborator per the spec; this is
/// the minimal stand-in needed to exercise the decision path end to end.
fn resolve_principal(headers: &HeaderMap) -> Result<String, ServerError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| ServerError::Unauthenticated("missing authorization header".to_owned()))?;

    let value = header
        .to_str()
        .map_err(|_| ServerError::Unauthenticated("authorization header is not valid UTF-8".to_owned()))?;

    let username = value
        .strip_prefix("Bearer ")
        .ok_or_else(|| ServerError::Unauthenticated("expected a bearer token".to_owned()))?
        .trim();

    if username.is_empty() {
        return Err(ServerError::Unauthenticated("empty bearer token".to_owned()));
    }

    Ok(username.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_header_is_unauthenticated() {
        let headers = HeaderMap::new();
        assert!(matches!(resolve_principal(&headers), Err(ServerError::Unauthenticated(_))));
    }

    #[test]
    fn non_bearer_scheme_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, "Basic YWxpY2U6cGFzcw==".parse().unwrap());
        assert!(matches!(resolve_principal(&headers), Err(ServerError::Unauthenticated(_))));
    }

    #[test]
    fn bearer_token_becomes_username() {
        let mut headers = HeaderMap::new();
        headers.insert(axum::http::header::AUTHORIZATION, "Bearer alice".parse().unwrap());
        assert_eq!(resolve_principal(&headers).unwrap(), "alice");
    }
}
