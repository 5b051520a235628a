pub mod codec;
pub mod mapper;
pub mod messages;
pub mod resolver;
pub mod signature;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt, TryStreamExt};
use log::{debug, error, info, warn};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, RwLock};
use tokio_tungstenite::{
    connect_async, tungstenite::Message as WsMessage, MaybeTlsStream, WebSocketStream,
};
use url::Url;

use crate::http_client::ApiClient;
use crate::provider::DanmuProvider;
use crate::session::SessionCache;
use crate::{ChatEvent, DanmuStreamError};
use resolver::{ChannelEndpoint, DeviceIdentity, RoomIdentity};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Keep-alive policy: this exact frame, unprompted, on a fixed cadence.
/// 3A 02 68 62 is a PushFrame with payloadType "hb".
pub const HEARTBEAT_PAYLOAD: [u8; 4] = [0x3A, 0x02, 0x68, 0x62];
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

type WsReadType = futures_util::stream::SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;
type WsWriteType =
    futures_util::stream::SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;

pub struct DouyinDanmu {
    room_input: String,
    cookie: String,
    session: Arc<SessionCache>,
    device: DeviceIdentity,
    room: RwLock<Option<RoomIdentity>>,
    stop: Arc<RwLock<bool>>,
    write: Arc<RwLock<Option<WsWriteType>>>,
}

impl DouyinDanmu {
    /// `room` accepts a live room URL, a `/user/` profile URL, or a bare
    /// room identifier.
    pub fn new(cookie: &str, room: &str, session: Arc<SessionCache>) -> Self {
        Self {
            room_input: room.to_string(),
            cookie: cookie.to_string(),
            session,
            device: DeviceIdentity::generate(),
            room: RwLock::new(None),
            stop: Arc::new(RwLock::new(false)),
            write: Arc::new(RwLock::new(None)),
        }
    }

    /// Channel negotiation: session cookie, room identity (resolved once,
    /// reused across reconnects), signed channel URL plus the headers the
    /// transport must send.
    pub async fn ws_endpoint(&self) -> Result<ChannelEndpoint, DanmuStreamError> {
        let cookie = if self.cookie.contains("ttwid") {
            self.cookie.clone()
        } else {
            let bootstrap = ApiClient::new(&self.cookie, USER_AGENT);
            format!("ttwid={};{}", self.session.ttwid(&bootstrap).await?, self.cookie)
        };
        let client = ApiClient::new(&cookie, USER_AGENT);

        let room = { self.room.read().await.clone() };
        let room = match room {
            Some(room) => room,
            None => {
                let room = resolver::resolve_room(&client, &self.room_input, USER_AGENT).await?;
                info!("Resolved douyin room {} -> {}", room.web_rid, room.room_id);
                *self.room.write().await = Some(room.clone());
                room
            }
        };

        let url = resolver::resolve(&room, &self.device, USER_AGENT)?;
        debug!("Douyin wss url: {url}");

        Ok(ChannelEndpoint {
            url,
            referer: "https://live.douyin.com/".to_string(),
            cookie,
            user_agent: USER_AGENT.to_string(),
        })
    }

    async fn connect_and_handle(
        &self,
        tx: mpsc::UnboundedSender<ChatEvent>,
    ) -> Result<(), DanmuStreamError> {
        let endpoint = self.ws_endpoint().await?;

        let host = Url::parse(&endpoint.url)?
            .host_str()
            .unwrap_or("webcast5-ws-web-lf.douyin.com")
            .to_string();

        let request = tokio_tungstenite::tungstenite::http::Request::builder()
            .uri(endpoint.url.as_str())
            .header(
                tokio_tungstenite::tungstenite::http::header::COOKIE,
                endpoint.cookie.as_str(),
            )
            .header(
                tokio_tungstenite::tungstenite::http::header::REFERER,
                endpoint.referer.as_str(),
            )
            .header(
                tokio_tungstenite::tungstenite::http::header::USER_AGENT,
                endpoint.user_agent.as_str(),
            )
            .header(tokio_tungstenite::tungstenite::http::header::HOST, host)
            .header(
                tokio_tungstenite::tungstenite::http::header::UPGRADE,
                "websocket",
            )
            .header(
                tokio_tungstenite::tungstenite::http::header::CONNECTION,
                "Upgrade",
            )
            .header(
                tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_VERSION,
                "13",
            )
            .header(
                tokio_tungstenite::tungstenite::http::header::SEC_WEBSOCKET_KEY,
                tokio_tungstenite::tungstenite::handshake::client::generate_key(),
            )
            .body(())
            .map_err(|e| DanmuStreamError::WebsocketError { err: e.to_string() })?;

        let (ws_stream, response) =
            connect_async(request)
                .await
                .map_err(|e| DanmuStreamError::WebsocketError {
                    err: format!("Failed to connect to douyin websocket: {e}"),
                })?;

        info!("WebSocket connection response: {:?}", response.status());

        let (write, read) = ws_stream.split();
        *self.write.write().await = Some(write);
        self.handle_connection(read, tx).await
    }

    async fn handle_connection(
        &self,
        mut read: WsReadType,
        tx: mpsc::UnboundedSender<ChatEvent>,
    ) -> Result<(), DanmuStreamError> {
        let stop = Arc::clone(&self.stop);
        let write = Arc::clone(&self.write);
        let heartbeat_handle = tokio::spawn(async move {
            let mut consecutive_failures = 0;
            const MAX_FAILURES: u32 = 3;

            loop {
                if *stop.read().await {
                    info!("Stopping douyin heartbeat");
                    break;
                }

                tokio::time::sleep(HEARTBEAT_INTERVAL).await;

                match Self::send_heartbeat(&write).await {
                    Ok(_) => consecutive_failures = 0,
                    Err(e) => {
                        error!("Failed to send heartbeat: {e}");
                        consecutive_failures += 1;

                        if consecutive_failures >= MAX_FAILURES {
                            error!("Too many consecutive heartbeat failures, closing connection");
                            break;
                        }
                    }
                }
            }
        });

        let stop = Arc::clone(&self.stop);
        let write = Arc::clone(&self.write);
        let message_handle = tokio::spawn(async move {
            while let Some(msg) =
                read.try_next()
                    .await
                    .map_err(|e| DanmuStreamError::WebsocketError {
                        err: format!("Failed to read message: {e}"),
                    })?
            {
                if *stop.read().await {
                    info!("Stopping douyin danmu stream");
                    break;
                }

                match msg {
                    WsMessage::Binary(data) => match codec::decode_frame(&data) {
                        Ok((events, ack)) => {
                            for event in events {
                                tx.send(event).map_err(|e| DanmuStreamError::WebsocketError {
                                    err: format!("Failed to send message to channel: {e}"),
                                })?;
                            }
                            if let Some(ack) = ack {
                                if let Some(write) = write.write().await.as_mut() {
                                    if let Err(e) = write.send(WsMessage::binary(ack)).await {
                                        error!("Failed to send ack: {e}");
                                    }
                                }
                            }
                        }
                        // one malformed frame is dropped, the stream continues
                        Err(e) => warn!("Dropping undecodable frame: {e}"),
                    },
                    WsMessage::Close(_) => {
                        info!("WebSocket connection closed");
                        break;
                    }
                    WsMessage::Ping(data) => {
                        if let Some(write) = write.write().await.as_mut() {
                            if let Err(e) = write.send(WsMessage::Pong(data)).await {
                                error!("Failed to send pong: {e}");
                                break;
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok::<(), DanmuStreamError>(())
        });

        tokio::select! {
            result = heartbeat_handle => {
                if let Err(e) = result {
                    error!("Heartbeat task failed: {e}");
                }
            }
            result = message_handle => {
                if let Err(e) = result {
                    error!("Message handling task failed: {e}");
                }
            }
        }

        Ok(())
    }

    async fn send_heartbeat(
        write: &Arc<RwLock<Option<WsWriteType>>>,
    ) -> Result<(), DanmuStreamError> {
        if let Some(write) = write.write().await.as_mut() {
            write
                .send(WsMessage::binary(HEARTBEAT_PAYLOAD.to_vec()))
                .await
                .map_err(|e| DanmuStreamError::WebsocketError {
                    err: format!("Failed to send heartbeat message: {e}"),
                })?;
        }
        Ok(())
    }
}

#[async_trait]
impl DanmuProvider for DouyinDanmu {
    async fn start(&self, tx: mpsc::UnboundedSender<ChatEvent>) -> Result<(), DanmuStreamError> {
        let mut retry_count = 0;
        const MAX_RETRIES: u32 = 5;
        const RETRY_DELAY: Duration = Duration::from_secs(5);
        info!(
            "Douyin WebSocket connection started, room: {}",
            self.room_input
        );

        loop {
            if *self.stop.read().await {
                break;
            }

            match self.connect_and_handle(tx.clone()).await {
                Ok(_) => {
                    info!("Douyin WebSocket connection closed normally");
                    break;
                }
                // nothing to retry without a valid room
                Err(e @ DanmuStreamError::InvalidRoom { .. }) => return Err(e),
                Err(e) => {
                    error!("Douyin WebSocket connection error: {e}");
                    retry_count += 1;

                    if retry_count >= MAX_RETRIES {
                        return Err(DanmuStreamError::WebsocketError {
                            err: format!("Failed to connect after {MAX_RETRIES} retries"),
                        });
                    }

                    info!(
                        "Retrying connection in {} seconds... (Attempt {}/{})",
                        RETRY_DELAY.as_secs(),
                        retry_count,
                        MAX_RETRIES
                    );
                    tokio::time::sleep(RETRY_DELAY).await;
                }
            }
        }

        Ok(())
    }

    async fn stop(&self) -> Result<(), DanmuStreamError> {
        *self.stop.write().await = true;
        if let Some(mut write) = self.write.write().await.take() {
            if let Err(e) = write.close().await {
                error!("Failed to close WebSocket connection: {e}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use prost::Message;

    use super::messages::PushFrame;
    use super::*;

    #[test]
    fn test_heartbeat_payload_is_hb_frame() {
        let frame = PushFrame {
            payload_type: "hb".to_string(),
            ..Default::default()
        };
        assert_eq!(frame.encode_to_vec(), HEARTBEAT_PAYLOAD.to_vec());
    }

    #[test]
    fn test_heartbeat_interval() {
        assert_eq!(HEARTBEAT_INTERVAL, Duration::from_secs(10));
    }
}
