//! Signal handling for the event loop

use tokio::signal::ctrl_c;
use tokio::sync::mpsc;
use tracing::info;

use crate::application::LoopEvent;

/// Post [`LoopEvent::Shutdown`] to the loop when Ctrl+C arrives
pub fn forward_shutdown(tx: mpsc::Sender<LoopEvent>) {
    tokio::spawn(async move {
        if ctrl_c().await.is_ok() {
            info!("interrupt received");
            let _ = tx.send(LoopEvent::Shutdown).await;
        }
    });
}
