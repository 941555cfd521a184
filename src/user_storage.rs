use crate::storage::{Collection, RecordStore};
use crate::user_models::User;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("Username already exists")]
    DuplicateUsername,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub struct UserStorage {
    records: Arc<RecordStore>,
}

impl UserStorage {
    pub fn new(records: Arc<RecordStore>) -> Self {
        Self { records }
    }

    /// Appends `user` unless its username is already taken. The check and the
    /// write happen under the users collection lock.
    pub async fn create_user(&self, user: User) -> Result<User, UserStoreError> {
        self.records
            .update(Collection::Users, |users: &mut Vec<User>| {
                if users.iter().any(|u| u.username == user.username) {
                    return Err(UserStoreError::DuplicateUsername);
                }
                users.push(user.clone());
                Ok(user)
            })
            .await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Option<User> {
        self.records
            .read::<User>(Collection::Users)
            .await
            .into_iter()
            .find(|u| u.username == username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn duplicate_username_is_rejected_once_stored() {
        let dir = TempDir::new().unwrap();
        let records = Arc::new(RecordStore::new(dir.path()));
        let storage = UserStorage::new(records.clone());

        storage
            .create_user(User::new("admin".into(), "hash-1".into()))
            .await
            .unwrap();
        let second = storage
            .create_user(User::new("admin".into(), "hash-2".into()))
            .await;

        assert!(matches!(second, Err(UserStoreError::DuplicateUsername)));

        let users: Vec<User> = records.read(Collection::Users).await;
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].password_hash, "hash-1");
    }

    #[tokio::test]
    async fn finds_user_by_username() {
        let dir = TempDir::new().unwrap();
        let storage = UserStorage::new(Arc::new(RecordStore::new(dir.path())));
        let created = storage
            .create_user(User::new("editor".into(), "hash".into()))
            .await
            .unwrap();

        let found = storage.get_user_by_username("editor").await.unwrap();
        assert_eq!(found.id, created.id);
        assert!(storage.get_user_by_username("nobody").await.is_none());
    }
}
