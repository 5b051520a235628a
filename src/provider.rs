pub mod douyin;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{ChatEvent, DanmuStreamError};

/// A platform chat-stream client: started once, it feeds normalized events
/// into the channel until the connection ends or `stop` is called.
#[async_trait]
pub trait DanmuProvider: Send + Sync {
    /// Connects and pumps events into `tx`. Only returns after the stream
    /// has been stopped or the connection is given up on.
    async fn start(&self, tx: mpsc::UnboundedSender<ChatEvent>) -> Result<(), DanmuStreamError>;

    async fn stop(&self) -> Result<(), DanmuStreamError>;
}
