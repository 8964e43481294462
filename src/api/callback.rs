use std::{collections::HashMap, sync::Arc};

use axum::{Extension, extract::Query, http::StatusCode};
use tokio::sync::oneshot;

use crate::{
    error::{Error, Result},
    server::{AuthorizationState, PendingAuthorization},
    types::Credential,
    warning,
};

const SUCCESS_BODY: &str = "Authentication successful! You can close this window.";
const MISSING_CODE_BODY: &str = "No authorization code found";
const EXCHANGE_FAILED_BODY: &str = "Error obtaining access token";
const ALREADY_RESOLVED_BODY: &str = "Authorization already completed";

pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(pending): Extension<Arc<PendingAuthorization>>,
) -> (StatusCode, &'static str) {
    // Only the first request may resolve the authorization.
    let Some(resolver) = pending.claim().await else {
        return (StatusCode::GONE, ALREADY_RESOLVED_BODY);
    };

    let Some(code) = params.get("code").filter(|c| !c.is_empty()) else {
        pending.transition(AuthorizationState::NoCodeReceived).await;
        let _ = resolver.send(Err(Error::MissingCode(params.get("error").cloned())));
        return (StatusCode::BAD_REQUEST, MISSING_CODE_BODY);
    };

    pending.transition(AuthorizationState::CodeReceived).await;

    // The exchange outlives this request: a browser that disconnects early
    // still gets its code exchanged and the outcome delivered.
    let exchange = tokio::spawn(resolve(Arc::clone(&pending), resolver, code.clone()));
    match exchange.await {
        Ok(reply) => reply,
        Err(e) => {
            warning!("Token exchange task failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, EXCHANGE_FAILED_BODY)
        }
    }
}

async fn resolve(
    pending: Arc<PendingAuthorization>,
    resolver: oneshot::Sender<Result<Credential>>,
    code: String,
) -> (StatusCode, &'static str) {
    pending.transition(AuthorizationState::Exchanging).await;

    match pending.exchange().exchange(&code).await {
        Ok(credential) => {
            pending.transition(AuthorizationState::ExchangeSucceeded).await;
            let _ = resolver.send(Ok(credential));
            (StatusCode::OK, SUCCESS_BODY)
        }
        Err(e) => {
            warning!("Error obtaining access token: {}", e);
            pending.transition(AuthorizationState::ExchangeFailed).await;
            let _ = resolver.send(Err(e));
            (StatusCode::INTERNAL_SERVER_ERROR, EXCHANGE_FAILED_BODY)
        }
    }
}
