//! # HTTP Front End
//!
//! Kannel-compatible `sendsms` interface in front of the real gateway.
//!
//! | Gate verdict                 | Response                                   |
//! |------------------------------|--------------------------------------------|
//! | forward original             | gateway status, `Content-Type` and body    |
//! | parts forwarded              | last part's gateway reply                  |
//! | part failed                  | failing reply / 502 / 412, plus `X-Proxy-Failed-Part` |
//! | suppressed                   | 412                                        |
//! | no usable recipient          | 400                                        |

pub mod request;

use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{RawQuery, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use proxy_telemetry::{metric_inc, DISPATCH_OUTCOMES};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use vp_05_dispatch_gate::{DispatchReport, GatewayReply, MessageDispatch, PartFailure};

use crate::adapters::{KannelGateway, PartRelay};
use request::KannelRequest;

pub const FAILED_PART_HEADER: &str = "x-proxy-failed-part";

/// Shared by every request handler.
pub struct ProxyState<G> {
    pub gate: Arc<G>,
    pub gateway: Arc<KannelGateway>,
}

impl<G> Clone for ProxyState<G> {
    fn clone(&self) -> Self {
        Self {
            gate: Arc::clone(&self.gate),
            gateway: Arc::clone(&self.gateway),
        }
    }
}

pub fn router<G: MessageDispatch + 'static>(path: &str, state: ProxyState<G>) -> Router {
    Router::new()
        .route(path, get(send_as_get::<G>).post(send_as_post::<G>))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(addr = %addr, "listening for sendsms requests");
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn send_as_get<G: MessageDispatch + 'static>(
    State(state): State<ProxyState<G>>,
    RawQuery(query): RawQuery,
) -> Response {
    let request = KannelRequest::from_query(query.as_deref().unwrap_or_default());
    handle(&state, request).await
}

async fn send_as_post<G: MessageDispatch + 'static>(
    State(state): State<ProxyState<G>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = KannelRequest::from_post(&headers, &body);
    handle(&state, request).await
}

async fn handle<G: MessageDispatch>(state: &ProxyState<G>, request: KannelRequest) -> Response {
    let message = match request.to_message() {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, "rejecting request");
            metric_inc!(DISPATCH_OUTCOMES, &["invalid"]);
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    let relay = PartRelay::new(&state.gateway, &request);
    match state.gate.dispatch(&message, &relay).await {
        DispatchReport::ForwardOriginal { .. } => match state.gateway.forward_original(&request).await {
            Ok(reply) => mirror(reply),
            Err(e) => {
                error!(error = %e, "gateway request failed");
                StatusCode::BAD_GATEWAY.into_response()
            }
        },
        DispatchReport::PartsForwarded { reply, .. } => mirror(reply),
        DispatchReport::PartFailed { ordinal, failure } => {
            let mut response = match failure {
                PartFailure::Rejected(reply) => mirror(reply),
                PartFailure::Transport(_) => StatusCode::BAD_GATEWAY.into_response(),
                PartFailure::Suppressed(_) => StatusCode::PRECONDITION_FAILED.into_response(),
            };
            response
                .headers_mut()
                .insert(FAILED_PART_HEADER, HeaderValue::from(u16::from(ordinal)));
            response
        }
        DispatchReport::Suppressed { .. } => StatusCode::PRECONDITION_FAILED.into_response(),
    }
}

/// Hand the gateway's answer back to the caller.
fn mirror(reply: GatewayReply) -> Response {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
    let mut response = (status, reply.body).into_response();
    // `Vec<u8>` bodies default to application/octet-stream
    response.headers_mut().remove(header::CONTENT_TYPE);
    if let Some(value) = reply
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
    {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    response
}

async fn health() -> &'static str {
    "ok"
}

async fn metrics() -> Response {
    match proxy_telemetry::encode_metrics() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "metrics encoding failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
