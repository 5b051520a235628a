pub mod danmu_stream;
pub mod http_client;
pub mod provider;
pub mod session;

use thiserror::Error;

use crate::provider::douyin::messages::CommonMessage;

#[derive(Error, Debug)]
pub enum DanmuStreamError {
    #[error("HttpError {0:?}")]
    HttpError(#[from] reqwest::Error),
    #[error("ParseError {0:?}")]
    ParseError(#[from] url::ParseError),
    #[error("WebsocketError {err}")]
    WebsocketError { err: String },
    #[error("InvalidRoom {err}")]
    InvalidRoom { err: String },
    #[error("InvalidIdentifier {err}")]
    InvalidIdentifier { err: String },
    #[error("FrameDecodeError {err}")]
    FrameDecode { err: String },
    #[error("PayloadDecompressError {err}")]
    PayloadDecompress { err: String },
    #[error("BatchDecodeError {err}")]
    BatchDecode { err: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Danmaku,
    Other,
}

/// One normalized chat event, produced per inbound raw message.
///
/// Messages this client does not decode keep their raw form in `raw` so a
/// consumer can handle further message types without re-decoding the frame.
#[derive(Debug, Clone)]
pub struct ChatEvent {
    /// timestamp in milliseconds
    pub timestamp: i64,
    pub user_name: String,
    pub content: String,
    pub kind: MessageKind,
    pub color: String,
    pub raw: Option<CommonMessage>,
}
