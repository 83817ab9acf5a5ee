//! Basic NNTP client example
//!
//! Run with: cargo run --example basic

use usenet_engine::{NntpClient, ServerConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Configure the NNTP server
    // Replace with your actual server credentials
    let config = ServerConfig {
        host: std::env::var("NNTP_HOST").unwrap_or_else(|_| "news.example.com".to_string()),
        port: std::env::var("NNTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(563),
        tls: true,
        allow_insecure_tls: false,
        username: std::env::var("NNTP_USER").unwrap_or_else(|_| "user".to_string()),
        password: std::env::var("NNTP_PASS").unwrap_or_else(|_| "pass".to_string()),
        command_timeout_ms: 15_000,
    };

    println!("Connecting to {}:{}...", config.host, config.port);

    // Connect to the server
    let mut client = NntpClient::connect(Arc::new(config)).await?;
    println!("Connected!");

    // Authenticate
    client.authenticate().await?;
    println!("Authenticated!");

    // Select a newsgroup
    let group = std::env::var("NNTP_GROUP").unwrap_or_else(|_| "alt.test".to_string());
    let group_info = client.select_group(&group).await?;
    println!(
        "Selected group '{}': {} articles ({}-{})",
        group, group_info.count, group_info.first, group_info.last
    );

    // Fetch headers for the most recent article
    if group_info.count > 0 {
        println!("\nFetching HEAD {}...", group_info.last);
        let head = client.fetch_head(&group_info.last.to_string()).await?;
        for line in head.lines.iter().take(10) {
            println!("  {}", line);
        }
    }

    // Close gracefully
    client.quit().await?;
    println!("\nConnection closed.");

    Ok(())
}
