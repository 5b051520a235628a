use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};

use crate::{
    provider::{douyin::DouyinDanmu, DanmuProvider},
    session::SessionCache,
    ChatEvent, DanmuStreamError,
};

/// Consumer-facing handle for one room's chat stream.
///
/// The session cache lives here, at the composition root, and is handed to
/// the provider by reference.
#[derive(Clone)]
pub struct DanmuStream {
    pub identifier: String,
    pub room_input: String,
    session: Arc<SessionCache>,
    provider: Arc<RwLock<Box<dyn DanmuProvider>>>,
    tx: mpsc::UnboundedSender<ChatEvent>,
    rx: Arc<RwLock<mpsc::UnboundedReceiver<ChatEvent>>>,
}

impl DanmuStream {
    /// `identifier` is the platform cookie string; `room` is a room URL,
    /// `/user/` profile URL, or bare room identifier.
    pub async fn new(identifier: &str, room: &str) -> Result<Self, DanmuStreamError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Arc::new(SessionCache::new());
        let provider = DouyinDanmu::new(identifier, room, Arc::clone(&session));
        Ok(Self {
            identifier: identifier.to_string(),
            room_input: room.to_string(),
            session,
            provider: Arc::new(RwLock::new(Box::new(provider))),
            tx,
            rx: Arc::new(RwLock::new(rx)),
        })
    }

    /// Runs the stream until it is stopped or given up on. `stop` stays
    /// callable concurrently, so this only takes the provider read lock.
    pub async fn start(&self) -> Result<(), DanmuStreamError> {
        self.provider.read().await.start(self.tx.clone()).await
    }

    pub async fn stop(&self) -> Result<(), DanmuStreamError> {
        self.provider.read().await.stop().await?;
        // close channel
        self.rx.write().await.close();
        Ok(())
    }

    pub async fn recv(&self) -> Result<Option<ChatEvent>, DanmuStreamError> {
        Ok(self.rx.write().await.recv().await)
    }

    pub fn session(&self) -> &SessionCache {
        &self.session
    }
}
