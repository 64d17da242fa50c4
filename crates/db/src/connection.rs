use mongodb::{Client, Database, options::ClientOptions};
use socium_config::Settings;
use tracing::info;

/// Opens a pooled client, pings the server and returns the configured database.
pub async fn connect(settings: &Settings) -> Result<Database, mongodb::error::Error> {
    let mut client_options = ClientOptions::parse(&settings.database.url).await?;
    client_options.app_name = Some("socium".to_string());
    client_options.max_pool_size = settings.database.max_pool_size.or(client_options.max_pool_size);
    client_options.min_pool_size = settings.database.min_pool_size.or(client_options.min_pool_size);

    let client = Client::with_options(client_options)?;

    client
        .database("admin")
        .run_command(bson::doc! { "ping": 1 })
        .await?;

    info!(
        db = %settings.database.name,
        max_pool = ?settings.database.max_pool_size,
        "Connected to MongoDB"
    );

    Ok(client.database(&settings.database.name))
}
