mod cli;
mod shuffler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Spotify credentials may live in a local .env file
    dotenvy::dotenv().ok();
    env_logger::init();

    cli::run().await?;

    Ok(())
}
