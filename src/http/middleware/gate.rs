//! Axum adapter for the request gate.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header::AUTHORIZATION, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::gate::{GateContext, RequestGate};
use crate::security::client_ip::client_key;

/// Run the gate and attach the resolved [`crate::auth::Principal`] to the request.
pub async fn gate_middleware(
    State(gate): State<Arc<RequestGate>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    // Absent when the router is served without connect info (tests, oneshot).
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let credential = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let ctx = GateContext::new(
        req.method().clone(),
        req.uri().path(),
        client_key(req.headers(), peer),
        credential,
    );

    match gate.evaluate(ctx) {
        Ok(principal) => {
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        Err(rejection) => rejection.into_response(),
    }
}
