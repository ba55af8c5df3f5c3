use std::sync::Arc;

use crate::db::Directory;
use crate::mail::Mailer;
use crate::media::MediaStore;
use crate::realtime::ConnectionRegistry;
use crate::services::notifications::Notifier;
use crate::utils::Config;

/// Shared handles passed to every handler and service.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub directory: Arc<dyn Directory>,
    pub registry: ConnectionRegistry,
    pub notifier: Notifier,
    pub media: Arc<dyn MediaStore>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(
        config: Config,
        directory: Arc<dyn Directory>,
        media: Arc<dyn MediaStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let registry = ConnectionRegistry::new();
        let notifier = Notifier::new(directory.clone(), registry.clone());
        Self {
            config: Arc::new(config),
            directory,
            registry,
            notifier,
            media,
            mailer,
        }
    }
}
