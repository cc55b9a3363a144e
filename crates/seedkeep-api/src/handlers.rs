//! Request handlers.

use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header::CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use tracing::{error, info, warn};

use crate::error::WebhookRejection;
use crate::payload::{Admission, WebhookPayload};
use crate::promoter::PromotionVerdict;
use crate::state::ApiState;

pub(crate) const IGNORED: &str = "Torrent not in a watched category, action ignored.";
pub(crate) const PROMOTED: &str = "Promotion action successful.";
pub(crate) const FAILED: &str = "Promotion action failed.";

pub(crate) async fn webhook(
    State(state): State<ApiState>,
    payload: Result<Json<WebhookPayload>, JsonRejection>,
) -> Response {
    match handle_notification(&state, payload).await {
        Ok(response) => response,
        Err(rejection) => {
            match &rejection {
                WebhookRejection::InvalidStructure { detail } => {
                    warn!(reason = %rejection, detail = %detail, "webhook rejected");
                }
                WebhookRejection::Busy { hash } => {
                    warn!(info_hash = %hash, "promotion already in flight");
                }
                _ => warn!(reason = %rejection, "webhook rejected"),
            }
            state.metrics.inc_webhook_verdict(rejection.verdict());
            rejection.into_response()
        }
    }
}

async fn handle_notification(
    state: &ApiState,
    payload: Result<Json<WebhookPayload>, JsonRejection>,
) -> Result<Response, WebhookRejection> {
    let Json(payload) = payload?;
    let request = match payload.admit(&state.watch_category)? {
        Admission::Promote(request) => request,
        Admission::Ignore {
            original,
            category,
            result,
        } => {
            info!(
                info_hash = %original.hash,
                name = %original.name,
                category = category.as_deref().unwrap_or(""),
                result = result.as_deref().unwrap_or(""),
                "notification not eligible; ignored"
            );
            state.metrics.inc_webhook_verdict("ignored");
            return Ok((StatusCode::OK, IGNORED).into_response());
        }
    };

    let ticket = state
        .in_flight
        .claim(&request.original.hash)
        .ok_or_else(|| WebhookRejection::Busy {
            hash: request.original.hash.clone(),
        })?;

    info!(
        info_hash = %request.original.hash,
        name = %request.original.name,
        duplicates = request.duplicates.len(),
        "promotion admitted"
    );
    let promoter = Arc::clone(&state.promoter);
    let run = tokio::spawn(async move {
        let _ticket = ticket;
        promoter.promote(request).await
    });
    let verdict = match run.await {
        Ok(verdict) => verdict,
        Err(err) => {
            error!(error = %err, "promotion task aborted");
            PromotionVerdict::Failed
        }
    };

    state.metrics.inc_webhook_verdict(verdict.as_str());
    Ok(match verdict {
        PromotionVerdict::Promoted => (StatusCode::OK, PROMOTED).into_response(),
        PromotionVerdict::Failed => (StatusCode::INTERNAL_SERVER_ERROR, FAILED).into_response(),
    })
}

pub(crate) async fn health() -> &'static str {
    "ok"
}

pub(crate) async fn metrics(State(state): State<ApiState>) -> Response {
    match state.metrics.render() {
        Ok(body) => Response::builder()
            .status(StatusCode::OK)
            .header(CONTENT_TYPE, "text/plain; version=0.0.4")
            .body(Body::from(body))
            .unwrap_or_else(|err| {
                error!(error = %err, "failed to build metrics response");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }),
        Err(err) => {
            error!(error = %err, "failed to render metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
