use chrono::Duration;
use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::Credentials;
use crate::config::Config;
use crate::storage::RecordStore;
use crate::uploads::Uploads;
use crate::user_storage::UserStorage;

pub struct AppState {
    pub records: Arc<RecordStore>,
    pub users: UserStorage,
    pub credentials: Credentials,
    pub uploads: Uploads,
    pub public_dir: PathBuf,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let records = Arc::new(RecordStore::new(&config.data_dir));

        Self {
            users: UserStorage::new(records.clone()),
            records,
            credentials: Credentials::new(
                &config.jwt_secret,
                Duration::hours(config.token_ttl_hours),
                config.bcrypt_cost,
            ),
            uploads: Uploads::new(&config.uploads_dir),
            public_dir: config.public_dir.clone(),
        }
    }
}
