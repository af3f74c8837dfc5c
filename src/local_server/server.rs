use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use axum::{Router, routing::get};
use axum_server::{Handle, tls_rustls::RustlsConfig};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{AuthError, CaptureResult, KeyMaterial};

use super::config::LocalServerConfig;
use super::http::{
    CaptureState, ResponseReceiver, callback_handler, fallback_handler, send_response,
    wait_for_response,
};

/// Lets the acknowledgement page reach the browser before connections are cut.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

static CRYPTO_PROVIDER: Once = Once::new();

fn install_crypto_provider() {
    CRYPTO_PROVIDER.call_once(|| {
        // Fails only if a provider is already installed.
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
    });
}

#[derive(Debug, Clone)]
pub struct LocalServer {
    config: LocalServerConfig,
}

impl LocalServer {
    pub fn from_config(config: LocalServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LocalServerConfig {
        &self.config
    }

    pub fn bind(&self) -> Result<TcpListener, AuthError> {
        let addr = SocketAddr::new(self.config.bind_addr, self.config.port);
        let listener = TcpListener::bind(addr).map_err(|source| AuthError::Listen {
            addr: addr.to_string(),
            source,
        })?;
        debug!(addr = %listener.local_addr()?, "bound loopback listener");
        Ok(listener)
    }

    pub async fn start(
        &self,
        listener: TcpListener,
        key_material: KeyMaterial,
    ) -> Result<CaptureHandle, AuthError> {
        install_crypto_provider();

        let tls = RustlsConfig::from_pem(
            key_material.certificate_pem().as_bytes().to_vec(),
            key_material.private_key_pem().as_bytes().to_vec(),
        )
        .await
        .map_err(AuthError::certificate)?;
        drop(key_material);

        let (response_tx, response_rx) = oneshot::channel::<Result<CaptureResult, AuthError>>();
        let response_tx = Arc::new(Mutex::new(Some(response_tx)));

        let state = CaptureState {
            code_param: self.config.code_param.clone(),
            response_tx: response_tx.clone(),
        };

        let app = Router::new()
            .route(&self.config.path, get(callback_handler))
            .fallback(fallback_handler)
            .with_state(state);

        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let handle = Handle::new();
        let server = axum_server::from_tcp_rustls(listener, tls)
            .handle(handle.clone())
            .serve(app.into_make_service());

        let task = tokio::spawn(async move {
            if let Err(err) = server.await {
                let error = AuthError::ServerFailed {
                    message: err.to_string(),
                };
                send_response(&response_tx, Err(error));
            }
        });

        info!(addr = %local_addr, "capture server listening");

        Ok(CaptureHandle {
            local_addr,
            shutdown: Some(handle),
            task: Some(task),
            response_rx: Some(response_rx),
        })
    }
}

/// Running capture server. Stopping (or dropping) it releases the port exactly once.
pub struct CaptureHandle {
    local_addr: SocketAddr,
    shutdown: Option<Handle>,
    task: Option<JoinHandle<()>>,
    response_rx: Option<ResponseReceiver>,
}

impl CaptureHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub async fn wait(&mut self, timeout: Option<Duration>) -> Result<CaptureResult, AuthError> {
        let response_rx = self
            .response_rx
            .take()
            .ok_or_else(|| AuthError::ServerFailed {
                message: "capture result was already consumed".to_string(),
            })?;
        wait_for_response(response_rx, timeout).await
    }

    pub async fn stop(mut self) {
        if let Some(handle) = self.shutdown.take() {
            handle.graceful_shutdown(Some(SHUTDOWN_GRACE));
        }
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "capture server task did not exit cleanly");
            }
        }
        debug!(addr = %self.local_addr, "capture server stopped");
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        if let Some(handle) = self.shutdown.take() {
            handle.shutdown();
        }
    }
}
