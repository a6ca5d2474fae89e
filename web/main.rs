mod photo;

use axum::{
    Router,
    routing::{get, post},
};
use garou::{blob::BlobStore, config::Config, database::Database, vision::VisionClient};
use photo::AppState;
use sqlx::Pool;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    let _ = dotenvy::dotenv();

    let config = Config::from_env().expect("incomplete configuration");

    #[cfg(feature = "sqlite")]
    {
        use sqlx::{Sqlite, migrate::MigrateDatabase};

        Sqlite::create_database(&config.database_url).await.unwrap();
    }

    let db = Database::with_migration(Pool::connect(&config.database_url).await.unwrap())
        .await
        .unwrap();
    let store = BlobStore::new(
        &config.storage_endpoint,
        &config.storage_container,
        &config.storage_access_key,
    );
    let tagger = VisionClient::new(&config.vision_endpoint, &config.vision_key);

    let state = AppState {
        db: Arc::new(db),
        store: Arc::new(store),
        tagger: Arc::new(tagger),
    };

    let app = Router::new()
        .route("/photos/", post(photo::upload_photo))
        .route("/photos/list/", get(photo::list_photos))
        .route(
            "/photos/{id}/",
            get(photo::get_photo)
                .put(photo::update_photo)
                .delete(photo::delete_photo),
        )
        .route("/photos/{id}/retag/", post(photo::retag_photo))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .unwrap();
    axum::serve(listener, app).await.unwrap();
}
