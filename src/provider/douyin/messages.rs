use prost::Message;
use std::collections::HashMap;

// message PushFrame {
//   uint64 seqId = 1;
//   uint64 logId = 2;
//   uint64 service = 3;
//   uint64 method = 4;
//   repeated HeadersList headersList = 5;
//   string payloadEncoding = 6;
//   string payloadType = 7;
//   bytes payload = 8;
// }

#[derive(Message, Clone)]
pub struct PushFrame {
    #[prost(uint64, tag = "1")]
    pub seq_id: u64,
    #[prost(uint64, tag = "2")]
    pub log_id: u64,
    #[prost(uint64, tag = "3")]
    pub service: u64,
    #[prost(uint64, tag = "4")]
    pub method: u64,
    #[prost(message, repeated, tag = "5")]
    pub headers_list: Vec<HeadersList>,
    #[prost(string, tag = "6")]
    pub payload_encoding: String,
    #[prost(string, tag = "7")]
    pub payload_type: String,
    #[prost(bytes, tag = "8")]
    pub payload: Vec<u8>,
}

#[derive(Message, Clone)]
pub struct HeadersList {
    #[prost(string, tag = "1")]
    pub key: String,
    #[prost(string, tag = "2")]
    pub value: String,
}

// message Response {
//   repeated Message messagesList = 1;
//   string cursor = 2;
//   uint64 fetchInterval = 3;
//   uint64 now = 4;
//   string internalExt = 5;
//   uint32 fetchType = 6;
//   map<string, string> routeParams = 7;
//   uint64 heartbeatDuration = 8;
//   bool needAck = 9;
//   string pushServer = 10;
//   string liveCursor = 11;
//   bool historyNoMore = 12;
// }

#[derive(Message, Clone)]
pub struct Response {
    #[prost(message, repeated, tag = "1")]
    pub messages_list: Vec<CommonMessage>,
    #[prost(string, tag = "2")]
    pub cursor: String,
    #[prost(uint64, tag = "3")]
    pub fetch_interval: u64,
    #[prost(uint64, tag = "4")]
    pub now: u64,
    #[prost(string, tag = "5")]
    pub internal_ext: String,
    #[prost(uint32, tag = "6")]
    pub fetch_type: u32,
    #[prost(map = "string, string", tag = "7")]
    pub route_params: HashMap<String, String>,
    #[prost(uint64, tag = "8")]
    pub heartbeat_duration: u64,
    #[prost(bool, tag = "9")]
    pub need_ack: bool,
    #[prost(string, tag = "10")]
    pub push_server: String,
    #[prost(string, tag = "11")]
    pub live_cursor: String,
    #[prost(bool, tag = "12")]
    pub history_no_more: bool,
}

#[derive(Message, Clone)]
pub struct CommonMessage {
    #[prost(string, tag = "1")]
    pub method: String,
    #[prost(bytes, tag = "2")]
    pub payload: Vec<u8>,
    #[prost(int64, tag = "3")]
    pub msg_id: i64,
    #[prost(int32, tag = "4")]
    pub msg_type: i32,
    #[prost(int64, tag = "5")]
    pub offset: i64,
    #[prost(bool, tag = "6")]
    pub need_wrds_store: bool,
    #[prost(int64, tag = "7")]
    pub wrds_version: i64,
    #[prost(string, tag = "8")]
    pub wrds_sub_key: String,
}

// The payload schemas below keep only the fields this client reads; prost
// skips unknown tags, so the full platform messages still decode.

#[derive(Message, Clone)]
pub struct Common {
    #[prost(string, tag = "1")]
    pub method: String,
    #[prost(uint64, tag = "2")]
    pub msg_id: u64,
    #[prost(uint64, tag = "3")]
    pub room_id: u64,
    #[prost(uint64, tag = "4")]
    pub create_time: u64,
    #[prost(bool, tag = "6")]
    pub is_show_msg: bool,
    #[prost(string, tag = "7")]
    pub describe: String,
}

#[derive(Message, Clone)]
pub struct User {
    #[prost(uint64, tag = "1")]
    pub id: u64,
    #[prost(uint64, tag = "2")]
    pub short_id: u64,
    #[prost(string, tag = "3")]
    pub nick_name: String,
    #[prost(uint32, tag = "6")]
    pub level: u32,
    #[prost(string, tag = "38")]
    pub display_id: String,
    #[prost(string, tag = "46")]
    pub sec_uid: String,
    #[prost(string, tag = "1028")]
    pub id_str: String,
}

#[derive(Message, Clone)]
pub struct ChatMessage {
    #[prost(message, optional, tag = "1")]
    pub common: Option<Common>,
    #[prost(message, optional, tag = "2")]
    pub user: Option<User>,
    #[prost(string, tag = "3")]
    pub content: String,
    #[prost(bool, tag = "4")]
    pub visible_to_sender: bool,
    #[prost(uint64, tag = "15")]
    pub event_time: u64,
}
