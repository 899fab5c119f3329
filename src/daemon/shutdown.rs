use tokio::select;
use tokio_util::sync::CancellationToken;

/// Detects signals sent to the process. An open session is flushed on the
/// way out, but an abrupt kill still loses it.
pub async fn detect_shutdown(cancelation: CancellationToken) {
    select! {
        _ = tokio::signal::ctrl_c() => {
            cancelation.cancel();
        },
    };
}
