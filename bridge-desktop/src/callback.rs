//! Loopback OAuth redirect listener
//!
//! Serves `GET /` on a local port with axum and hands the first redirect that
//! carries OAuth parameters to the waiting consent flow, then shuts the server
//! down. The listener only lives for the duration of the interactive consent.

use async_trait::async_trait;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use bridge_traits::{
    auth::{AuthCallbackListener, AuthorizationCallback},
    error::{BridgeError, Result},
};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, info, warn};

const SUCCESS_PAGE: &str = "The authentication flow has completed. You may close this window.";

/// Sender for the first redirect, taken by whichever request delivers it
type RedirectSlot = Arc<Mutex<Option<oneshot::Sender<AuthorizationCallback>>>>;

struct RunningServer {
    port: u16,
    redirect: Option<oneshot::Receiver<AuthorizationCallback>>,
    shutdown: Option<oneshot::Sender<()>>,
}

/// One-shot HTTP listener on `localhost:<port>`
///
/// The socket is only bound when [`AuthCallbackListener::start`] is called,
/// so runs that already hold a valid token never touch the port. Dropping the
/// listener stops the server.
pub struct LoopbackCallbackListener {
    requested_port: u16,
    server: Mutex<Option<RunningServer>>,
}

impl LoopbackCallbackListener {
    /// Create a listener for `port`. Port `0` picks a free port on start.
    pub fn new(port: u16) -> Self {
        Self {
            requested_port: port,
            server: Mutex::new(None),
        }
    }

    /// Port actually bound, once started
    pub async fn bound_port(&self) -> Option<u16> {
        self.server.lock().await.as_ref().map(|server| server.port)
    }

    async fn bind(port: u16) -> Result<TcpListener> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        TcpListener::bind(addr).await.map_err(|e| {
            BridgeError::NotAvailable(format!(
                "Cannot listen for the OAuth redirect on port {}: {}",
                port, e
            ))
        })
    }

    fn serve(listener: TcpListener) -> Result<RunningServer> {
        let port = listener.local_addr()?.port();
        let (redirect_tx, redirect_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = redirect_router(Arc::new(Mutex::new(Some(redirect_tx))));

        tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    // Fires on an explicit signal or when the listener is dropped
                    let _ = shutdown_rx.await;
                })
                .await;

            match served {
                Ok(()) => debug!(port, "Callback server stopped"),
                Err(e) => warn!(port, error = %e, "Callback server failed"),
            }
        });

        debug!(port, "Loopback callback listener bound");
        Ok(RunningServer {
            port,
            redirect: Some(redirect_rx),
            shutdown: Some(shutdown_tx),
        })
    }
}

fn redirect_router(slot: RedirectSlot) -> Router {
    Router::new()
        .route("/", get(handle_redirect))
        .with_state(slot)
}

async fn handle_redirect(
    State(slot): State<RedirectSlot>,
    Query(callback): Query<AuthorizationCallback>,
) -> (StatusCode, &'static str) {
    // Browsers also hit the bare root or ask for a favicon
    if callback.code.is_none() && callback.error.is_none() {
        debug!("Ignoring request without OAuth parameters");
        return (StatusCode::NOT_FOUND, "");
    }

    match slot.lock().await.take() {
        Some(sender) => {
            if sender.send(callback).is_err() {
                warn!("OAuth redirect arrived after the consent flow stopped waiting");
            }
        }
        None => debug!("OAuth redirect already received"),
    }

    (StatusCode::OK, SUCCESS_PAGE)
}

#[async_trait]
impl AuthCallbackListener for LoopbackCallbackListener {
    async fn start(&self) -> Result<String> {
        let mut guard = self.server.lock().await;
        if guard.is_none() {
            let listener = Self::bind(self.requested_port).await?;
            *guard = Some(Self::serve(listener)?);
        }

        let port = guard
            .as_ref()
            .map_or(self.requested_port, |server| server.port);
        Ok(format!("http://localhost:{}/", port))
    }

    async fn present_authorization_url(&self, url: &str) -> Result<()> {
        println!(
            "Please visit this URL to authorize this application: {}",
            url
        );
        Ok(())
    }

    async fn wait_for_callback(&self) -> Result<AuthorizationCallback> {
        let redirect = {
            let mut guard = self.server.lock().await;
            let server = guard.as_mut().ok_or_else(|| {
                BridgeError::OperationFailed("Callback listener was not started".to_string())
            })?;

            info!(port = server.port, "Waiting for OAuth redirect");
            server.redirect.take().ok_or_else(|| {
                BridgeError::OperationFailed("OAuth redirect was already consumed".to_string())
            })?
        };

        let callback = redirect.await.map_err(|_| {
            BridgeError::OperationFailed(
                "Callback server stopped before the redirect arrived".to_string(),
            )
        })?;

        if let Some(shutdown) = self
            .server
            .lock()
            .await
            .as_mut()
            .and_then(|server| server.shutdown.take())
        {
            let _ = shutdown.send(());
        }

        Ok(callback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn router_with_receiver() -> (Router, oneshot::Receiver<AuthorizationCallback>) {
        let (tx, rx) = oneshot::channel();
        (redirect_router(Arc::new(Mutex::new(Some(tx)))), rx)
    }

    async fn get_status_and_body(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_redirect_query_is_decoded() {
        let (app, rx) = router_with_receiver();

        let (status, body) = get_status_and_body(app, "/?state=abc&code=4%2F0Ad&scope=x").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, SUCCESS_PAGE);
        let callback = rx.await.unwrap();
        assert_eq!(callback.code.as_deref(), Some("4/0Ad"));
        assert_eq!(callback.state.as_deref(), Some("abc"));
        assert_eq!(callback.error, None);
    }

    #[tokio::test]
    async fn test_redirect_with_error_parameter() {
        let (app, rx) = router_with_receiver();

        let (status, _) = get_status_and_body(app, "/?error=access_denied&state=s").await;

        assert_eq!(status, StatusCode::OK);
        let callback = rx.await.unwrap();
        assert_eq!(callback.error.as_deref(), Some("access_denied"));
        assert_eq!(callback.code, None);
    }

    #[tokio::test]
    async fn test_favicon_and_bare_root_are_not_found() {
        let (app, mut rx) = router_with_receiver();

        let (favicon, _) = get_status_and_body(app.clone(), "/favicon.ico").await;
        let (root, _) = get_status_and_body(app, "/").await;

        assert_eq!(favicon, StatusCode::NOT_FOUND);
        assert_eq!(root, StatusCode::NOT_FOUND);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_start_binds_lazily_and_is_idempotent() {
        let listener = LoopbackCallbackListener::new(0);
        assert_eq!(listener.bound_port().await, None);

        let uri = listener.start().await.unwrap();
        let port = listener.bound_port().await.unwrap();

        assert_ne!(port, 0);
        assert_eq!(uri, format!("http://localhost:{}/", port));
        assert_eq!(listener.start().await.unwrap(), uri);
    }

    #[tokio::test]
    async fn test_wait_before_start_fails() {
        let listener = LoopbackCallbackListener::new(0);
        assert!(listener.wait_for_callback().await.is_err());
    }

    #[tokio::test]
    async fn test_wait_for_callback_over_loopback() {
        let listener = LoopbackCallbackListener::new(0);
        listener.start().await.unwrap();
        let port = listener.bound_port().await.unwrap();

        let browser = tokio::spawn(async move {
            let favicon = reqwest::get(format!("http://127.0.0.1:{}/favicon.ico", port))
                .await
                .unwrap();
            let redirect = reqwest::get(format!(
                "http://127.0.0.1:{}/?code=the-code&state=st",
                port
            ))
            .await
            .unwrap();
            (
                favicon.status().as_u16(),
                redirect.status().as_u16(),
                redirect.text().await.unwrap(),
            )
        });

        let callback = listener.wait_for_callback().await.unwrap();
        let (favicon_status, redirect_status, page) = browser.await.unwrap();

        assert_eq!(callback.code.as_deref(), Some("the-code"));
        assert_eq!(callback.state.as_deref(), Some("st"));
        assert_eq!(favicon_status, 404);
        assert_eq!(redirect_status, 200);
        assert_eq!(page, SUCCESS_PAGE);
        assert!(listener.wait_for_callback().await.is_err());
    }
}
