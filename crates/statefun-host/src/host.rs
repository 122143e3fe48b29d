//! Server lifecycle: binds the discovery service plus whatever entity
//! services the caller registers, and serves until the process is asked to
//! shut down.

use statefun_core::discovery::DiscoveryHandler;
use statefun_wire::proto::discovery_server::DiscoveryServer;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Notify;
use tonic::transport::server::Router;

use crate::discovery_service::DiscoveryService;

/// Coordinates a graceful quiesce: stop accepting new streams, let in-flight
/// command loops drain, close the gRPC server, then invoke a callback.
/// Cloning shares the same underlying signal, so a handle can be held by
/// whatever triggers shutdown (a signal handler, a management endpoint)
/// independently of the task running [`serve_with_shutdown`].
#[derive(Clone)]
pub struct ShutdownHandle {
    stop: Arc<Notify>,
    drained: Arc<Notify>,
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self {
            stop: Arc::new(Notify::new()),
            drained: Arc::new(Notify::new()),
        }
    }

    /// Requests quiesce and waits for the server to fully stop before
    /// invoking `callback`. Safe to call more than once; later calls observe
    /// the same drain.
    pub async fn try_shutdown(&self, callback: impl FnOnce() + Send) {
        self.stop.notify_one();
        self.drained.notified().await;
        callback();
    }
}

/// Starts serving on `addr`. `add_services` receives a [`Router`] that
/// already has the discovery service mounted, and should add every entity
/// service this process hosts (`ValueEntityService`, `EventSourcedService`,
/// `ReplicatedEntityService`, `ActionService`) before returning it.
///
/// Runs until the process is killed; has no quiesce mechanism of its own.
/// Use [`serve_with_shutdown`] when a caller needs to trigger a graceful
/// stop.
pub async fn serve(
    addr: SocketAddr,
    discovery_handler: DiscoveryHandler,
    add_services: impl FnOnce(Router) -> Router,
) -> Result<(), tonic::transport::Error> {
    serve_with_shutdown(addr, discovery_handler, add_services, &ShutdownHandle::new()).await
}

/// Like [`serve`], but stops accepting new streams and drains in-flight ones
/// once `shutdown.try_shutdown` is called from elsewhere.
pub async fn serve_with_shutdown(
    addr: SocketAddr,
    discovery_handler: DiscoveryHandler,
    add_services: impl FnOnce(Router) -> Router,
    shutdown: &ShutdownHandle,
) -> Result<(), tonic::transport::Error> {
    let discovery = DiscoveryServer::new(DiscoveryService::new(Arc::new(discovery_handler)));
    let router = tonic::transport::Server::builder().add_service(discovery);
    let router = add_services(router);

    tracing::info!(%addr, "statefun runtime listening");
    let stop = shutdown.stop.clone();
    let result = router.serve_with_shutdown(addr, async move { stop.notified().await }).await;
    tracing::info!(%addr, "statefun runtime drained, server closed");
    shutdown.drained.notify_waiters();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn try_shutdown_runs_the_callback_after_the_server_drains() {
        let shutdown = ShutdownHandle::new();
        let server_shutdown = shutdown.clone();

        let server = tokio::spawn(async move {
            // Stands in for `serve_with_shutdown`'s drain wait without
            // needing a real listener bound in a unit test.
            server_shutdown.stop.notified().await;
            server_shutdown.drained.notify_waiters();
        });

        let callback_ran = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = callback_ran.clone();
        shutdown
            .try_shutdown(move || flag.store(true, std::sync::atomic::Ordering::SeqCst))
            .await;

        server.await.unwrap();
        assert!(callback_ran.load(std::sync::atomic::Ordering::SeqCst));
    }
}
