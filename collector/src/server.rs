use crate::router::{
    create_router,
    AppState,
};
use eyre::{
    Context as _,
    Result,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Serve the collector on `listener` until `shutdown` is cancelled, then
/// finish in-flight requests and return.
pub async fn serve(listener: TcpListener, state: AppState, shutdown: CancellationToken) -> Result<()> {
    let address = listener.local_addr()?;
    info!(parent: &state.span, sink = state.sink.name(), "listening on {address}");

    let span = state.span.clone();
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .wrap_err("collector server failed")?;

    info!(parent: &span, "collector stopped");
    Ok(())
}
