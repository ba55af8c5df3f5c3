use std::sync::Arc;

use lif::db::{migrations, DatabaseConfig, Directory, MemoryDirectory, PgDirectory};
use lif::mail::{LogMailer, Mailer, ResendMailer};
use lif::media::{CloudinaryMediaStore, LocalMediaStore, MediaStore};
use lif::services::maintenance::run_pending_call_expiry;
use lif::{create_router, get_db_pool, utils, AppState, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    utils::init_logging();

    let config = Config::from_env()?;

    let directory: Arc<dyn Directory> = match DatabaseConfig::from_env_optional() {
        Some(db_config) => {
            let pool = get_db_pool(&db_config).await?;
            migrations::run_migrations(&pool).await?;
            Arc::new(PgDirectory::new(pool))
        }
        None => {
            tracing::warn!("⚠️ DATABASE_URL not set, using in-memory storage (data is lost on restart)");
            Arc::new(MemoryDirectory::new())
        }
    };

    let media: Arc<dyn MediaStore> = match config.cloudinary.clone() {
        Some(cloudinary) => Arc::new(CloudinaryMediaStore::new(cloudinary)),
        None => Arc::new(LocalMediaStore::new(config.media_dir.clone()).await?),
    };

    let mailer: Arc<dyn Mailer> = match config.resend_api_key.clone() {
        Some(api_key) => Arc::new(ResendMailer::new(api_key, config.email_from.clone())),
        None => {
            tracing::warn!("⚠️ RESEND_API_KEY not set, outgoing mail is only logged");
            Arc::new(LogMailer::new())
        }
    };

    let port = config.port;
    let state = AppState::new(config, directory, media, mailer);
    tokio::spawn(run_pending_call_expiry(state.clone()));

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&format!("0.0.0.0:{}", port)).await?;
    tracing::info!("🚀 Server running on port {}", port);

    axum::serve(listener, app).await?;

    Ok(())
}
