//! Demonstrate instant repeat access through the disk cache

use std::time::Instant;

use robx_cache::CachedHttpClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = CachedHttpClient::new().await?;
    let url = "https://games.roblox.com/v1/games/sorts";

    let started = Instant::now();
    let first = client.cache_get(url).send().await?;
    println!(
        "first call:  {} in {:?}",
        first.status_code(),
        started.elapsed()
    );

    let started = Instant::now();
    let second = client.cache_get(url).send().await?;
    println!(
        "second call: {} in {:?}",
        second.status_code(),
        started.elapsed()
    );

    Ok(())
}
