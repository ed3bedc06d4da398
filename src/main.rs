#[tokio::main]
async fn main() {
    if let Err(e) = spot_reviews_be::start_server().await {
        tracing::error!("Server error: {}", e);
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
