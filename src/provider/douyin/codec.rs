use std::io::Read;

use flate2::read::GzDecoder;
use prost::Message;

use super::mapper::map_message;
use super::messages::{PushFrame, Response};
use crate::{ChatEvent, DanmuStreamError};

/// Decodes one inbound push frame into chat events plus the optional ack
/// frame bytes the transport must send back.
///
/// Events keep the order the server put them in. No partial results: any
/// malformed layer aborts decoding of this frame only, the stream itself
/// continues with the next frame.
pub fn decode_frame(data: &[u8]) -> Result<(Vec<ChatEvent>, Option<Vec<u8>>), DanmuStreamError> {
    let frame = PushFrame::decode(data)
        .map_err(|e| DanmuStreamError::FrameDecode { err: e.to_string() })?;

    // the channel is negotiated with compress=gzip, the payload is always
    // compressed
    let mut decoder = GzDecoder::new(frame.payload.as_slice());
    let mut decompressed = Vec::new();
    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| DanmuStreamError::PayloadDecompress { err: e.to_string() })?;

    let response = Response::decode(decompressed.as_slice())
        .map_err(|e| DanmuStreamError::BatchDecode { err: e.to_string() })?;

    let ack = if response.need_ack {
        let mut ack_frame = PushFrame {
            payload_type: "ack".to_string(),
            log_id: frame.log_id,
            ..Default::default()
        };
        // the web client overwrites the placeholder tag with internalExt
        ack_frame.payload_type = response.internal_ext.clone();
        Some(ack_frame.encode_to_vec())
    } else {
        None
    };

    let events = response.messages_list.into_iter().map(map_message).collect();

    Ok((events, ack))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::write::GzEncoder;
    use flate2::Compression;

    use super::*;
    use crate::provider::douyin::messages::{ChatMessage, CommonMessage, User};
    use crate::MessageKind;

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn frame_bytes(log_id: u64, response: &Response) -> Vec<u8> {
        PushFrame {
            log_id,
            payload_type: "msg".to_string(),
            payload: gzip(&response.encode_to_vec()),
            ..Default::default()
        }
        .encode_to_vec()
    }

    #[test]
    fn test_ack_round_trip() {
        let response = Response {
            need_ack: true,
            internal_ext: "internal_src:dim|seq:1".to_string(),
            ..Default::default()
        };

        let (events, ack) = decode_frame(&frame_bytes(42, &response)).unwrap();
        assert!(events.is_empty());

        let ack = PushFrame::decode(ack.unwrap().as_slice()).unwrap();
        assert_eq!(ack.log_id, 42);
        assert_eq!(ack.payload_type, "internal_src:dim|seq:1");
    }

    #[test]
    fn test_no_ack_without_need_ack() {
        let response = Response::default();
        let (_, ack) = decode_frame(&frame_bytes(1, &response)).unwrap();
        assert!(ack.is_none());
    }

    #[test]
    fn test_batch_preserves_message_order() {
        let chat = ChatMessage {
            user: Some(User {
                nick_name: "Alice".to_string(),
                ..Default::default()
            }),
            content: "hi".to_string(),
            ..Default::default()
        };
        let response = Response {
            messages_list: vec![
                CommonMessage {
                    method: "WebcastChatMessage".to_string(),
                    payload: chat.encode_to_vec(),
                    ..Default::default()
                },
                CommonMessage {
                    method: "WebcastGiftMessage".to_string(),
                    ..Default::default()
                },
                CommonMessage {
                    method: "WebcastRoomStatsMessage".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        let (events, ack) = decode_frame(&frame_bytes(1, &response)).unwrap();
        assert!(ack.is_none());
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].kind, MessageKind::Danmaku);
        assert_eq!(events[0].user_name, "Alice");
        assert_eq!(events[0].content, "hi");
        assert_eq!(events[1].kind, MessageKind::Other);
        assert_eq!(events[2].kind, MessageKind::Other);
    }

    #[test]
    fn test_malformed_outer_frame() {
        // truncated varint
        assert!(matches!(
            decode_frame(&[0x08]),
            Err(DanmuStreamError::FrameDecode { .. })
        ));
    }

    #[test]
    fn test_corrupted_payload_then_stream_continues() {
        let bad = PushFrame {
            log_id: 7,
            payload: b"definitely not gzip".to_vec(),
            ..Default::default()
        }
        .encode_to_vec();
        assert!(matches!(
            decode_frame(&bad),
            Err(DanmuStreamError::PayloadDecompress { .. })
        ));

        // a later well-formed frame still decodes
        let response = Response {
            need_ack: true,
            internal_ext: "ext".to_string(),
            ..Default::default()
        };
        let (_, ack) = decode_frame(&frame_bytes(8, &response)).unwrap();
        assert!(ack.is_some());
    }

    #[test]
    fn test_garbage_inside_gzip() {
        let bad = PushFrame {
            log_id: 9,
            payload: gzip(&[0x08]),
            ..Default::default()
        }
        .encode_to_vec();
        assert!(matches!(
            decode_frame(&bad),
            Err(DanmuStreamError::BatchDecode { .. })
        ));
    }
}
