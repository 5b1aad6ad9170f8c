//! Front-end authentication and the admin authorization gate.
//!
//! Every `/api` request must carry the pre-shared key of the trusted front end, which is
//! the only party allowed to assert a caller principal. Admin routes then run the caller
//! through an [`AdminGate`] and only reach their handlers once the gate is
//! [`GateState::Authorized`].

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use subtle::ConstantTimeEq;

use crate::client::CatalogClient;
use crate::errors::{AppError, AppErrorWithRevision};
use crate::remote::Caller;
use crate::AppState;

/// Header carrying the caller principal.
pub const CALLER_HEADER: &str = "x-caller-principal";

/// Header name for the front-end API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Caller identity from `x-caller-principal`.
pub fn caller_from_headers(headers: &HeaderMap) -> Caller {
    let principal = headers
        .get(CALLER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|p| !p.is_empty());

    match principal {
        Some(p) => Caller::Principal(p.to_string()),
        None => Caller::Anonymous,
    }
}

/// Middleware admitting only requests that carry the configured pre-shared key, either in
/// `x-api-key` or as a bearer token. With no key configured every request passes (dev mode).
pub async fn psk_auth_layer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(expected) = state.api_psk.as_deref() else {
        return next.run(request).await;
    };

    let headers = request.headers();
    let accepted = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
        .map(|provided| constant_time_compare(provided, expected));

    let message = match accepted {
        Some(true) => return next.run(request).await,
        Some(false) => "Invalid API key",
        None => "Missing API key",
    };
    tracing::warn!(path = %request.uri().path(), "Rejected request: {}", message);

    AppErrorWithRevision {
        error: AppError::Unauthorized(message.to_string()),
        revision_id: state.client.revision().await,
    }
    .into_response()
}

fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum GateState {
    Unauthenticated,
    CheckingPermission,
    Denied,
    Error { message: String },
    Authorized,
}

/// Admin access state machine for one caller.
#[derive(Debug, Clone)]
pub struct AdminGate {
    state: GateState,
}

impl Default for AdminGate {
    fn default() -> Self {
        Self::new()
    }
}

impl AdminGate {
    pub fn new() -> Self {
        Self {
            state: GateState::Unauthenticated,
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    /// Identity established; start the permission check.
    pub fn login(&mut self) {
        if self.state == GateState::Unauthenticated {
            self.state = GateState::CheckingPermission;
        }
    }

    /// Apply the outcome of an admin check. Returns false if the gate was not waiting for one.
    pub fn resolve<E: std::fmt::Display>(&mut self, outcome: Result<bool, E>) -> bool {
        if self.state != GateState::CheckingPermission {
            return false;
        }
        self.state = match outcome {
            Ok(true) => GateState::Authorized,
            Ok(false) => GateState::Denied,
            Err(e) => GateState::Error {
                message: e.to_string(),
            },
        };
        true
    }

    /// Start another check after an error.
    pub fn retry(&mut self) -> bool {
        if matches!(self.state, GateState::Error { .. }) {
            self.state = GateState::CheckingPermission;
            true
        } else {
            false
        }
    }

    #[cfg(test)]
    pub fn logout(&mut self) {
        self.state = GateState::Unauthenticated;
    }

    pub fn allows_protected_content(&self) -> bool {
        self.state == GateState::Authorized
    }

    /// Text shown in place of admin content.
    pub fn placeholder(&self) -> Option<&'static str> {
        match self.state {
            GateState::Unauthenticated => Some("Please log in to access the admin panel."),
            GateState::CheckingPermission => Some("Checking permissions..."),
            GateState::Denied => Some(
                "You do not have permission to access the admin panel. \
                 Only administrators can manage study materials.",
            ),
            GateState::Error { .. } => Some("Unable to verify admin permissions. Please try again."),
            GateState::Authorized => None,
        }
    }
}

/// Run the admin check for `caller`, retrying once if it fails.
pub async fn check_admin(client: &CatalogClient, caller: &Caller) -> AdminGate {
    let mut gate = AdminGate::new();
    if caller.principal().is_none() {
        return gate;
    }

    gate.login();
    gate.resolve(client.is_caller_admin(caller).await);
    if let GateState::Error { message } = gate.state() {
        tracing::warn!("Admin check failed, retrying once: {}", message);
        gate.retry();
        gate.resolve(client.is_caller_admin(caller).await);
    }
    gate
}

/// Middleware guarding admin routes. Authorized callers are passed on as an extension.
///
/// The gate runs before the handler, so its admin check reaches the backend even for a
/// request whose body later fails validation. Validation still happens before the
/// mutation call itself.
pub async fn admin_guard_layer(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let caller = caller_from_headers(request.headers());
    let gate = check_admin(&state.client, &caller).await;
    if gate.allows_protected_content() {
        request.extensions_mut().insert(caller);
        return next.run(request).await;
    }
    let placeholder = gate.placeholder().unwrap_or_default().to_string();

    let error = match gate.state() {
        GateState::Unauthenticated => AppError::Unauthorized(placeholder),
        GateState::Denied => {
            tracing::info!(principal = caller.principal(), "Admin access denied");
            AppError::Forbidden(placeholder)
        }
        GateState::Error { message } => {
            tracing::warn!(principal = caller.principal(), "Admin check unavailable: {}", message);
            AppError::Unavailable(placeholder)
        }
        GateState::CheckingPermission | GateState::Authorized => AppError::Unavailable(placeholder),
    };

    AppErrorWithRevision {
        error,
        revision_id: state.client.revision().await,
    }
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_caller_from_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(caller_from_headers(&headers), Caller::Anonymous);

        // A bearer token is the front-end key, never a principal.
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer front-end-key"));
        assert_eq!(caller_from_headers(&headers), Caller::Anonymous);

        headers.insert(CALLER_HEADER, HeaderValue::from_static(" alice "));
        assert_eq!(caller_from_headers(&headers), Caller::Principal("alice".into()));

        headers.insert(CALLER_HEADER, HeaderValue::from_static("  "));
        assert_eq!(caller_from_headers(&headers), Caller::Anonymous);
    }

    #[test]
    fn test_gate_transitions() {
        let mut gate = AdminGate::new();
        assert!(!gate.resolve::<String>(Ok(true)));
        assert_eq!(gate.state(), &GateState::Unauthenticated);

        gate.login();
        assert_eq!(gate.state(), &GateState::CheckingPermission);
        assert!(gate.resolve(Err("transport down")));
        assert_eq!(
            gate.state(),
            &GateState::Error {
                message: "transport down".into()
            }
        );
        assert!(!gate.allows_protected_content());

        assert!(gate.retry());
        assert!(gate.resolve::<String>(Ok(false)));
        assert_eq!(gate.state(), &GateState::Denied);
        assert!(!gate.retry());

        gate.logout();
        gate.login();
        gate.resolve::<String>(Ok(true));
        assert!(gate.allows_protected_content());
        assert!(gate.placeholder().is_none());
    }

    #[test]
    fn test_stale_result_is_ignored() {
        let mut gate = AdminGate::new();
        gate.login();
        gate.logout();
        assert!(!gate.resolve::<String>(Ok(true)));
        assert!(!gate.allows_protected_content());
    }

    fn guarded(client: CatalogClient) -> axum::Router {
        use axum::{middleware, routing::get, Router};

        let state = crate::tests::state_with(client);
        Router::new()
            .route("/guarded", get(|| async { "protected" }))
            .layer(middleware::from_fn_with_state(state.clone(), admin_guard_layer))
            .with_state(state)
    }

    async fn status_for(client: CatalogClient, principal: Option<&'static str>) -> axum::http::StatusCode {
        use axum::body::Body;
        use tower::ServiceExt;

        let mut request = axum::http::Request::builder().uri("/guarded");
        if let Some(p) = principal {
            request = request.header(CALLER_HEADER, p);
        }
        guarded(client)
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn test_guard_statuses() {
        use crate::remote::{InMemoryBackend, RemoteHandle};
        use axum::http::StatusCode;
        use std::sync::Arc;

        let ready = || {
            let backend = InMemoryBackend::with_admins(vec!["root".into()]);
            CatalogClient::new(RemoteHandle::ready(Arc::new(backend)))
        };

        assert_eq!(status_for(ready(), None).await, StatusCode::UNAUTHORIZED);
        assert_eq!(status_for(ready(), Some("student")).await, StatusCode::FORBIDDEN);
        assert_eq!(status_for(ready(), Some("root")).await, StatusCode::OK);

        let initializing = CatalogClient::new(RemoteHandle::initializing());
        assert_eq!(
            status_for(initializing, Some("root")).await,
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_only_authorized_has_no_placeholder() {
        let mut gate = AdminGate::new();
        assert!(gate.placeholder().is_some());
        gate.login();
        assert!(gate.placeholder().is_some());
        gate.resolve(Err("x"));
        assert!(gate.placeholder().is_some());
    }
}
