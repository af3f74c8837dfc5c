use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    response::{Html, IntoResponse},
};
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::{AuthError, CaptureResult};

const PAGE_TEMPLATE: &str = include_str!("html/result.html");

type ResponseResult = Result<CaptureResult, AuthError>;
pub(super) type ResponseSender = oneshot::Sender<ResponseResult>;
pub(super) type ResponseReceiver = oneshot::Receiver<ResponseResult>;
pub(super) type SharedResponseSender = Arc<Mutex<Option<ResponseSender>>>;

#[derive(Clone)]
pub(super) struct CaptureState {
    pub(super) code_param: String,
    pub(super) response_tx: SharedResponseSender,
}

// Only the first call delivers anything.
pub(super) fn send_response(response_tx: &SharedResponseSender, response: ResponseResult) -> bool {
    let sender = match response_tx.lock() {
        Ok(mut guard) => guard.take(),
        Err(_) => None,
    };
    match sender {
        Some(sender) => sender.send(response).is_ok(),
        None => false,
    }
}

pub(super) async fn callback_handler(
    State(state): State<CaptureState>,
    RawQuery(query): RawQuery,
) -> impl IntoResponse {
    let result = CaptureResult::from_query(query.as_deref().unwrap_or_default(), &state.code_param);
    let success = result.is_success();
    let status = if success {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    let page = render_page(&result);

    if send_response(&state.response_tx, Ok(result)) {
        info!(success, "captured authorization redirect");
    } else {
        warn!("ignoring redirect received after the result was delivered");
    }

    (status, Html(page))
}

pub(super) async fn fallback_handler() -> impl IntoResponse {
    let page = render_page(&CaptureResult::Absent { error: None });
    (StatusCode::NOT_FOUND, Html(page))
}

pub fn render_page(result: &CaptureResult) -> String {
    let (color, icon, title, message) = match result {
        CaptureResult::Code { .. } => (
            "green",
            "&#10003;",
            "Authorized",
            "Successfully authenticated!",
        ),
        CaptureResult::Absent { .. } => ("red", "&#10008;", "Failed", "Authorization FAILED!"),
    };

    PAGE_TEMPLATE
        .replace("{{color}}", color)
        .replace("{{icon}}", icon)
        .replace("{{title}}", title)
        .replace("{{message}}", message)
}

pub(super) async fn wait_for_response(
    response_rx: ResponseReceiver,
    timeout: Option<Duration>,
) -> Result<CaptureResult, AuthError> {
    let received = match timeout {
        Some(timeout) => tokio::time::timeout(timeout, response_rx)
            .await
            .map_err(|_| AuthError::TimedOut { timeout })?,
        None => response_rx.await,
    };

    received.map_err(|_| AuthError::ServerFailed {
        message: "capture channel closed before a redirect arrived".to_string(),
    })?
}
