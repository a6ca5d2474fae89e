use clap::{Parser, Subcommand};
use garou::{
    app::{self, AppError, UploadPhotoCommand},
    blob::BlobStore,
    config::Config,
    database::Database,
    photo::join_tags,
    vision::VisionClient,
};
use sqlx::Pool;

#[derive(Parser)]
#[command(name = "garou")]
#[command(about = "Photo gallery CLI", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload an image, tag it, and create its record.
    Upload {
        #[arg(help = "Path to image file")]
        path: std::path::PathBuf,

        #[arg(short, long, help = "Photo title")]
        title: Option<String>,
    },
    /// Re-run tagging for an existing photo.
    Retag {
        #[arg(help = "Photo id")]
        id: i64,
    },
    /// Print all photos, newest first.
    List,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let _ = dotenvy::dotenv();
    let config = Config::from_env().expect("incomplete configuration");

    let db = Database::with_migration(Pool::connect(&config.database_url).await.unwrap())
        .await
        .unwrap();
    let store = BlobStore::new(
        &config.storage_endpoint,
        &config.storage_container,
        &config.storage_access_key,
    );
    let tagger = VisionClient::new(&config.vision_endpoint, &config.vision_key);

    match cli.command {
        Commands::Upload { path, title } => {
            let bytes = tokio::fs::read(&path)
                .await
                .expect("failed to read image bytes");
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();

            let cmd = UploadPhotoCommand {
                bytes,
                filename,
                title,
            };

            let photo = cmd.execute(&store, &tagger, &db).await?;

            println!("✅ Uploaded photo:");
            println!("{photo:?}");
        }
        Commands::Retag { id } => {
            let photo = app::retag_photo(&db, &store, &tagger, id).await?;

            println!("✅ Retagged photo {}: {}", photo.id, join_tags(&photo.tags));
        }
        Commands::List => {
            for photo in app::list_photos(&db).await? {
                println!(
                    "{}\t{}\t{}\t{}",
                    photo.id,
                    photo.title,
                    join_tags(&photo.tags),
                    photo.image
                );
            }
        }
    }

    Ok(())
}
