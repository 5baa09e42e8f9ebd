//! Credential persistence over two key-value tiers: a primary store plus a
//! best-effort local backup mirror. Reads fall back to the backup and heal
//! the primary on a hit.

use std::sync::Arc;

use pinpoint_common::OverlayError;

use crate::traits::KeyValueStore;

const PRIMARY_KEY: &str = "places_api_key";
const BACKUP_KEY: &str = "places_api_key_backup";

/// Expected key prefix; anything else is suspicious but still accepted.
const EXPECTED_PREFIX: &str = "AIza";
const MIN_KEY_LEN: usize = 30;

pub struct CredentialStore {
    primary: Arc<dyn KeyValueStore>,
    backup: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(primary: Arc<dyn KeyValueStore>, backup: Arc<dyn KeyValueStore>) -> Self {
        Self { primary, backup }
    }

    /// Heuristic shape check. Advisory only; a failing key is stored anyway.
    pub fn looks_valid(key: &str) -> bool {
        key.len() >= MIN_KEY_LEN && key.starts_with(EXPECTED_PREFIX)
    }

    /// Persist the key to the primary store and mirror it to the backup.
    /// Returns a warning message when the key's shape looks unusual.
    pub async fn save(&self, raw: &str) -> Result<Option<String>, OverlayError> {
        let key = raw.trim();
        if key.is_empty() {
            return Err(OverlayError::Validation(
                "API key must not be empty".to_string(),
            ));
        }

        let warning = (!Self::looks_valid(key))
            .then(|| "API key format looks unusual, saving anyway".to_string());
        if warning.is_some() {
            tracing::warn!(len = key.len(), "API key failed the format heuristic");
        }

        self.primary
            .set(PRIMARY_KEY, key)
            .await
            .map_err(|e| OverlayError::Storage(e.to_string()))?;

        if let Err(e) = self.backup.set(BACKUP_KEY, key).await {
            tracing::debug!(error = %e, "Backup mirror write failed");
        }

        tracing::info!("API key saved");
        Ok(warning)
    }

    /// Read the key: primary first, then the backup mirror. A backup hit
    /// re-writes the primary store.
    pub async fn load(&self) -> Result<Option<String>, OverlayError> {
        match self.primary.get(PRIMARY_KEY).await {
            Ok(Some(key)) => return Ok(Some(key)),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Primary credential read failed, trying backup")
            }
        }

        match self.backup.get(BACKUP_KEY).await {
            Ok(Some(key)) => {
                tracing::info!("API key restored from backup mirror");
                if let Err(e) = self.primary.set(PRIMARY_KEY, &key).await {
                    tracing::debug!(error = %e, "Could not re-write primary store");
                }
                Ok(Some(key))
            }
            Ok(None) => Ok(None),
            Err(e) => {
                tracing::debug!(error = %e, "Backup mirror read failed");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;

    fn stores() -> (Arc<MemoryStore>, Arc<MemoryStore>, CredentialStore) {
        let primary = Arc::new(MemoryStore::new());
        let backup = Arc::new(MemoryStore::new());
        let store = CredentialStore::new(primary.clone(), backup.clone());
        (primary, backup, store)
    }

    const GOOD_KEY: &str = "AIzaSyA1234567890abcdefghijklmnop";

    #[test]
    fn heuristic_accepts_expected_shape() {
        assert!(CredentialStore::looks_valid(GOOD_KEY));
        assert!(!CredentialStore::looks_valid("AIza-too-short"));
        assert!(!CredentialStore::looks_valid(
            "BKza-wrong-prefix-but-long-enough-0123"
        ));
    }

    #[tokio::test]
    async fn save_writes_both_tiers() {
        let (primary, backup, store) = stores();
        let warning = store.save(GOOD_KEY).await.unwrap();
        assert!(warning.is_none());
        assert_eq!(primary.get("places_api_key").await.unwrap().unwrap(), GOOD_KEY);
        assert_eq!(
            backup.get("places_api_key_backup").await.unwrap().unwrap(),
            GOOD_KEY
        );
    }

    #[tokio::test]
    async fn odd_key_is_saved_with_warning() {
        let (_, _, store) = stores();
        let warning = store.save("short-and-odd").await.unwrap();
        assert!(warning.is_some());
        assert_eq!(store.load().await.unwrap().unwrap(), "short-and-odd");
    }

    #[tokio::test]
    async fn whitespace_is_trimmed_and_empty_rejected() {
        let (_, _, store) = stores();
        store.save(&format!("  {GOOD_KEY}  ")).await.unwrap();
        assert_eq!(store.load().await.unwrap().unwrap(), GOOD_KEY);

        assert!(matches!(
            store.save("   ").await,
            Err(OverlayError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn backup_hit_heals_primary() {
        let (primary, backup, store) = stores();
        backup.set("places_api_key_backup", GOOD_KEY).await.unwrap();

        assert_eq!(store.load().await.unwrap().unwrap(), GOOD_KEY);
        assert_eq!(
            primary.get("places_api_key").await.unwrap().unwrap(),
            GOOD_KEY,
            "backup hit must re-write the primary store"
        );
    }

    #[tokio::test]
    async fn missing_everywhere_is_none() {
        let (_, _, store) = stores();
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn primary_write_failure_surfaces_as_storage_error() {
        let (primary, _, store) = stores();
        primary.fail_writes(true);
        assert!(matches!(
            store.save(GOOD_KEY).await,
            Err(OverlayError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn primary_read_failure_falls_back_to_backup() {
        let (primary, backup, store) = stores();
        backup.set("places_api_key_backup", GOOD_KEY).await.unwrap();
        primary.fail_reads(true);
        assert_eq!(store.load().await.unwrap().unwrap(), GOOD_KEY);
    }
}
