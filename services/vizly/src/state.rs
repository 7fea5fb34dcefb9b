use std::sync::Arc;

use tabular::{CsvReader, TableReader};

use crate::auth::TokenSigner;
use crate::config::AppConfig;
use crate::dataset_store::DatasetStore;
use crate::media::MediaStore;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn DatasetStore>,
    pub media: MediaStore,
    pub reader: Arc<dyn TableReader>,
    pub tokens: TokenSigner,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn DatasetStore>) -> Self {
        let tokens = TokenSigner::new(
            &config.secret_key,
            config.access_ttl_secs,
            config.refresh_ttl_secs,
        );
        Self {
            media: MediaStore::new(config.media_root.clone()),
            reader: Arc::new(CsvReader::new()),
            tokens,
            store,
            config,
        }
    }

    pub fn with_reader(mut self, reader: Arc<dyn TableReader>) -> Self {
        self.reader = reader;
        self
    }
}
