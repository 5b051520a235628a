use rand::Rng;
use regex::Regex;
use serde::Deserialize;

use super::signature::{sign, SigningParams};
use crate::http_client::{build_request_url, ApiClient};
use crate::DanmuStreamError;

const WSS_PUSH_URL: &str = "wss://webcast5-ws-web-lf.douyin.com/webcast/im/push/v2/";
const ROOM_ENTER_URL: &str = "https://live.douyin.com/webcast/room/web/enter/";

// https://lf-cdn-tos.bytescm.com/obj/static/webcast/douyin_live/7697.782665f8.js -> a.ry
const VERSION_CODE: u32 = 180800;
// same bundle -> ee.VERSION
const WEBCAST_SDK_VERSION: &str = "1.0.14-beta.0";

/// Resolved once before channel negotiation and immutable afterwards. The
/// `room_id` is the internal numeric id the push channel is keyed by, not
/// the short `web_rid` shown in room URLs.
#[derive(Debug, Clone)]
pub struct RoomIdentity {
    pub web_rid: String,
    pub room_id: String,
}

/// Per-client device identity, generated once and reused across reconnects.
#[derive(Debug, Clone)]
pub struct DeviceIdentity {
    pub user_unique_id: String,
    pub version_code: u32,
    pub webcast_sdk_version: String,
}

impl DeviceIdentity {
    /// Random id in the range the web client is observed to hand out.
    pub fn generate() -> Self {
        let user_unique_id = rand::rng()
            .random_range(7_300_000_000_000_000_000u64..=7_999_999_999_999_999_999)
            .to_string();
        Self {
            user_unique_id,
            version_code: VERSION_CODE,
            webcast_sdk_version: WEBCAST_SDK_VERSION.to_string(),
        }
    }
}

/// Everything the transport needs to open the push channel.
#[derive(Debug, Clone)]
pub struct ChannelEndpoint {
    pub url: String,
    pub referer: String,
    pub cookie: String,
    pub user_agent: String,
}

/// Extracts the short room identifier from a room URL or passes a bare
/// identifier through. A leading `+` is stripped.
pub fn parse_room_identifier(input: &str) -> Result<String, DanmuStreamError> {
    let rid = if let Some(rest) = input.split("douyin.com/").nth(1) {
        rest.split('/').next().unwrap_or_default().split('?').next().unwrap_or_default()
    } else if input.contains("://") {
        return Err(DanmuStreamError::InvalidRoom {
            err: format!("not a douyin room url: {input}"),
        });
    } else {
        input
    };
    normalize_identifier(rid)
}

fn normalize_identifier(rid: &str) -> Result<String, DanmuStreamError> {
    let rid = rid.strip_prefix('+').unwrap_or(rid);
    if rid.is_empty() {
        return Err(DanmuStreamError::InvalidRoom {
            err: "empty room identifier".to_string(),
        });
    }
    Ok(rid.to_string())
}

/// A `/user/` profile URL does not carry the room id; it only appears in
/// the RENDER_DATA json island embedded in the page.
pub async fn lookup_user_room(client: &ApiClient, url: &str) -> Result<String, DanmuStreamError> {
    let page = client.get(url).await?.text().await?;
    let island = page
        .split(r#"<script id="RENDER_DATA" type="application/json">"#)
        .nth(1)
        .and_then(|rest| rest.split("</script>").next())
        .ok_or_else(|| DanmuStreamError::InvalidRoom {
            err: format!("no RENDER_DATA island in user page: {url}"),
        })?;
    let decoded = urlencoding::decode(island).map_err(|e| DanmuStreamError::InvalidRoom {
        err: format!("undecodable RENDER_DATA island: {e}"),
    })?;

    let re = Regex::new(r#""web_rid":"([^"]+)""#).unwrap();
    let captures = re
        .captures(&decoded)
        .ok_or_else(|| DanmuStreamError::InvalidRoom {
            err: format!("no web_rid in user page: {url}"),
        })?;
    normalize_identifier(&captures[1])
}

#[derive(Deserialize)]
struct RoomEnterResponse {
    data: RoomEnterData,
}

#[derive(Deserialize)]
struct RoomEnterData {
    data: Vec<RoomDetail>,
}

#[derive(Deserialize)]
struct RoomDetail {
    id_str: String,
}

/// Fetches the internal room id for a short room identifier through the
/// decorated room-enter endpoint.
pub async fn enter_room(
    client: &ApiClient,
    web_rid: &str,
    user_agent: &str,
) -> Result<RoomIdentity, DanmuStreamError> {
    let url = build_request_url(&format!("{ROOM_ENTER_URL}?web_rid={web_rid}"), user_agent)?;
    let text = client.get(&url).await?.text().await?;
    let resp: RoomEnterResponse =
        serde_json::from_str(&text).map_err(|e| DanmuStreamError::InvalidRoom {
            err: format!("unexpected room info response for web_rid {web_rid}: {e}"),
        })?;

    let room_id = resp
        .data
        .data
        .first()
        .map(|room| room.id_str.clone())
        .unwrap_or_default();
    if room_id.is_empty() {
        return Err(DanmuStreamError::InvalidRoom {
            err: format!("no room info for web_rid {web_rid}"),
        });
    }

    Ok(RoomIdentity {
        web_rid: web_rid.to_string(),
        room_id,
    })
}

/// Resolves a room URL, `/user/` profile URL, or bare identifier into the
/// immutable room identity.
pub async fn resolve_room(
    client: &ApiClient,
    input: &str,
    user_agent: &str,
) -> Result<RoomIdentity, DanmuStreamError> {
    let web_rid = if input.contains("/user/") {
        lookup_user_room(client, input).await?
    } else {
        parse_room_identifier(input)?
    };
    enter_room(client, &web_rid, user_agent).await
}

/// Builds the signed push-channel URL. Pure: identical inputs produce an
/// identical URL, so a reconnect with the same identities negotiates the
/// same channel.
pub fn resolve(
    room: &RoomIdentity,
    device: &DeviceIdentity,
    user_agent: &str,
) -> Result<String, DanmuStreamError> {
    if room.room_id.is_empty() {
        return Err(DanmuStreamError::InvalidRoom {
            err: format!("missing internal room id for web_rid {}", room.web_rid),
        });
    }

    let version_code = device.version_code.to_string();
    let sig_params: SigningParams = vec![
        ("live_id", "1".to_string()),
        ("aid", "6383".to_string()),
        ("version_code", version_code.clone()),
        ("webcast_sdk_version", device.webcast_sdk_version.clone()),
        ("room_id", room.room_id.clone()),
        ("sub_room_id", String::new()),
        ("sub_channel_id", String::new()),
        ("did_rule", "3".to_string()),
        ("user_unique_id", device.user_unique_id.clone()),
        ("device_platform", "web".to_string()),
        ("device_type", String::new()),
        ("ac", String::new()),
        ("identity", "audience".to_string()),
    ];
    let signature = sign(&sig_params);

    let connect_params = [
        ("room_id", room.room_id.clone()),
        ("compress", "gzip".to_string()),
        ("version_code", version_code),
        ("webcast_sdk_version", device.webcast_sdk_version.clone()),
        ("live_id", "1".to_string()),
        ("did_rule", "3".to_string()),
        ("user_unique_id", device.user_unique_id.clone()),
        ("identity", "audience".to_string()),
        ("signature", signature),
    ];
    let query = connect_params
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    build_request_url(&format!("{WSS_PUSH_URL}?{query}"), user_agent)
}
