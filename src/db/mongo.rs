use mongodb::{
    bson::doc,
    options::{ClientOptions, IndexOptions, ServerApi, ServerApiVersion},
    Client, Database, IndexModel,
};
use std::sync::Arc;
use std::time::Duration;

use crate::db::{quotes, staff};
use crate::error::ApiResult;

pub async fn create_mongo_client(uri: &str) -> ApiResult<Arc<Client>> {
    log::info!("Connecting to MongoDB");

    let mut client_options = ClientOptions::parse(uri).await?;

    client_options.connect_timeout = Some(Duration::from_secs(10));
    client_options.server_selection_timeout = Some(Duration::from_secs(10));
    client_options.max_pool_size = Some(10);
    client_options.min_pool_size = Some(1);

    let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
    client_options.server_api = Some(server_api);

    let client = Client::with_options(client_options)?;

    match ping(&client.database("admin")).await {
        Ok(()) => log::info!("Connected to MongoDB and verified with ping"),
        Err(e) => {
            log::warn!("Connected to MongoDB but ping failed: {}", e);
            log::warn!("The API may still work, but some functionality might be impaired");
        }
    }

    Ok(Arc::new(client))
}

pub async fn ping(db: &Database) -> ApiResult<()> {
    db.run_command(doc! {"ping": 1}).await?;
    Ok(())
}

/// Unique quote references and staff emails.
pub async fn ensure_indexes(db: &Database) -> ApiResult<()> {
    let unique = || IndexOptions::builder().unique(true).build();

    quotes::collection(db)
        .create_index(
            IndexModel::builder()
                .keys(doc! {"package_reference": 1})
                .options(unique())
                .build(),
        )
        .await?;

    staff::collection(db)
        .create_index(
            IndexModel::builder()
                .keys(doc! {"email": 1})
                .options(unique())
                .build(),
        )
        .await?;

    log::info!("Database indexes ensured");
    Ok(())
}
