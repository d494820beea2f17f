//! Fetch public user info through the dispatcher

use robx_client::HttpClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = HttpClient::new()?;

    let response = client
        .get("https://users.roblox.com/v1/users/1")
        .send()
        .await?;

    println!("status: {}", response.status_code());
    println!("body: {}", response.text());

    Ok(())
}
