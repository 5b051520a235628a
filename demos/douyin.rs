use std::{sync::Arc, time::Duration};

use douyin_danmu::danmu_stream::DanmuStream;
use tokio::time::sleep;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::init();
    // Replace these with actual values. When a live starts, a fresh room id
    // is generated, so a room URL is the more stable input.
    let room = "https://live.douyin.com/7514298567821937427";
    let cookie = "your_cookie";
    let stream = Arc::new(DanmuStream::new(cookie, room).await?);

    log::info!("Start to receive danmu messages");

    let stream_clone = stream.clone();
    tokio::spawn(async move {
        let _ = stream_clone.start().await;
    });

    let stream_clone = stream.clone();
    tokio::spawn(async move {
        loop {
            if let Ok(Some(event)) = stream_clone.recv().await {
                log::info!(
                    "Received chat event: [{:?}] {}: {}",
                    event.kind,
                    event.user_name,
                    event.content
                );
            } else {
                log::info!("Channel closed");
                break;
            }
        }
    });

    sleep(Duration::from_secs(60)).await;

    stream.stop().await?;

    Ok(())
}
