// Console presenter: the stand-in consumer for the tray tooltip / overlay
// widgets. Real UI surfaces subscribe to the same broadcast channel and feed
// pointer/menu events back through the worker's command channel.

use crate::models::RenderedTick;
use tokio::sync::broadcast;

/// Prints the tooltip block whenever it changes. Ends when the snapshot
/// channel closes.
pub fn spawn_console(mut rx: broadcast::Receiver<RenderedTick>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut last = String::new();
        loop {
            match rx.recv().await {
                Ok(tick) => {
                    if tick.tooltip != last {
                        println!("{}", tick.tooltip);
                        last = tick.tooltip;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "presenter lagged behind snapshots");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
