//! One-shot local listener for the OAuth redirect.
//!
//! The listener serves a single callback route. The first request on that
//! route resolves the pending authorization (success or failure); any request
//! racing in after it is answered with `410 Gone` and never processed. Once
//! resolved, the server is shut down, and dropping the listener shuts it down
//! as well, so the port is released on every exit path.

use std::{fmt, net::SocketAddr, sync::Arc, time::Duration};

use axum::{Extension, Router, routing::get};
use tokio::{
    net::TcpListener,
    sync::{Mutex, oneshot},
    task::JoinHandle,
};

use crate::{
    api,
    error::{Error, Result},
    spotify::auth::CodeExchange,
    types::Credential,
};

/// Upper bound for in-flight responses to drain on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Lifecycle of one authorization attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationState {
    Idle,
    Listening,
    CodeReceived,
    Exchanging,
    ExchangeSucceeded,
    ExchangeFailed,
    NoCodeReceived,
    Closed,
}

impl fmt::Display for AuthorizationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthorizationState::Idle => "idle",
            AuthorizationState::Listening => "listening",
            AuthorizationState::CodeReceived => "code received",
            AuthorizationState::Exchanging => "exchanging",
            AuthorizationState::ExchangeSucceeded => "exchange succeeded",
            AuthorizationState::ExchangeFailed => "exchange failed",
            AuthorizationState::NoCodeReceived => "no code received",
            AuthorizationState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// State shared between the listener and its request handler.
pub struct PendingAuthorization {
    resolver: Mutex<Option<oneshot::Sender<Result<Credential>>>>,
    state: Mutex<AuthorizationState>,
    exchange: CodeExchange,
}

impl PendingAuthorization {
    /// Claims the right to resolve the authorization. Only the first caller
    /// gets the resolver.
    pub async fn claim(&self) -> Option<oneshot::Sender<Result<Credential>>> {
        self.resolver.lock().await.take()
    }

    pub async fn transition(&self, next: AuthorizationState) {
        *self.state.lock().await = next;
    }

    pub async fn state(&self) -> AuthorizationState {
        *self.state.lock().await
    }

    pub fn exchange(&self) -> &CodeExchange {
        &self.exchange
    }
}

/// A bound callback listener awaiting its single redirect.
pub struct CallbackListener {
    addr: SocketAddr,
    pending: Arc<PendingAuthorization>,
    outcome: Option<oneshot::Receiver<Result<Credential>>>,
    shutdown: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<()>>,
}

impl CallbackListener {
    /// Binds `addr` and starts serving `callback_path`.
    ///
    /// Fails with `Error::Auth` when the port is unavailable.
    pub async fn bind(
        addr: SocketAddr,
        callback_path: &str,
        exchange: CodeExchange,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Auth(format!("callback port {} unavailable: {e}", addr.port())))?;
        let addr = listener
            .local_addr()
            .map_err(|e| Error::Auth(format!("callback listener has no local address: {e}")))?;

        let (resolver, outcome) = oneshot::channel();
        let pending = Arc::new(PendingAuthorization {
            resolver: Mutex::new(Some(resolver)),
            state: Mutex::new(AuthorizationState::Idle),
            exchange,
        });

        let app = Router::new()
            .route(callback_path, get(api::callback))
            .layer(Extension(Arc::clone(&pending)));

        let (shutdown, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_rx.await.ok();
                })
                .await;
        });

        pending.transition(AuthorizationState::Listening).await;

        Ok(Self {
            addr,
            pending,
            outcome: Some(outcome),
            shutdown: Some(shutdown),
            server: Some(server),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn state(&self) -> AuthorizationState {
        self.pending.state().await
    }

    /// Waits for the redirect, then closes the listener whatever the outcome.
    pub async fn wait(&mut self) -> Result<Credential> {
        let outcome = match self.outcome.take() {
            Some(receiver) => match receiver.await {
                Ok(outcome) => outcome,
                Err(_) => Err(Error::Auth(
                    "callback listener stopped before a redirect arrived".to_string(),
                )),
            },
            None => Err(Error::Auth("authorization already resolved".to_string())),
        };

        self.close().await;
        outcome
    }

    /// Stops accepting connections and waits for in-flight responses to be
    /// written.
    pub async fn close(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(mut server) = self.server.take() {
            if tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await.is_err() {
                server.abort();
            }
        }
        self.pending.transition(AuthorizationState::Closed).await;
    }
}

impl Drop for CallbackListener {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(server) = self.server.take() {
            server.abort();
        }
    }
}
