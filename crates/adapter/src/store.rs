//! Local persistence: a flat key-value store, the user profile and the practice best score.
//!
//! Values are JSON documents. [`FileStore`] keeps one `<key>.json` file per key under a data
//! directory; [`MemoryStore`] is the in-process equivalent used by tests and headless runs.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::protocol::{now_ms, win_rate};
use crate::StoreError;

/// Key holding the user profile.
pub const USER_KEY: &str = "tetris_user";
/// Key holding the practice best score.
pub const BEST_SCORE_KEY: &str = "tetris_best_score";

/// Minimum nickname length after trimming.
pub const MIN_NICKNAME_LEN: usize = 2;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Read and decode a JSON value.
pub fn load<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(key)? {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

pub fn save<T: Serialize>(store: &mut dyn KeyValueStore, key: &str, value: &T) -> Result<(), StoreError> {
    let text = serde_json::to_string(value)?;
    store.set(key, &text)
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One JSON file per key under `dir`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.dir)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_games: u32,
    pub total_wins: u32,
    pub best_score: u32,
}

impl UserStats {
    pub fn win_rate(&self) -> u32 {
        win_rate(self.total_wins, self.total_games)
    }
}

/// Local player identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub display_name: String,
    /// Random 4-digit discriminator, 1000-9999.
    pub tag: u16,
    /// `"{display_name}#{tag}"`.
    pub full_display_name: String,
    pub created_at: u64,
    #[serde(default)]
    pub stats: UserStats,
}

impl UserProfile {
    /// Validate a nickname and assign a fresh tag.
    pub fn create<R: Rng + ?Sized>(nickname: &str, rng: &mut R) -> Result<Self, StoreError> {
        let name = nickname.trim();
        if name.chars().count() < MIN_NICKNAME_LEN {
            return Err(StoreError::NicknameTooShort {
                min: MIN_NICKNAME_LEN,
            });
        }
        let tag: u16 = rng.random_range(1000..=9999);
        Ok(Self {
            display_name: name.to_string(),
            tag,
            full_display_name: format!("{name}#{tag}"),
            created_at: now_ms(),
            stats: UserStats::default(),
        })
    }

    /// Fold one completed game into the stats.
    pub fn record_game(&mut self, score: u32, won: bool) {
        self.stats.total_games += 1;
        if won {
            self.stats.total_wins += 1;
        }
        self.stats.best_score = self.stats.best_score.max(score);
    }

    pub fn load(store: &dyn KeyValueStore) -> Result<Option<Self>, StoreError> {
        load(store, USER_KEY)
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        save(store, USER_KEY, self)
    }

    /// Forget the profile (nickname change assigns a new tag).
    pub fn clear(store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        store.remove(USER_KEY)
    }
}

pub fn load_best_score(store: &dyn KeyValueStore) -> Result<u32, StoreError> {
    Ok(load(store, BEST_SCORE_KEY)?.unwrap_or(0))
}

/// Persist `score` only if it beats the stored best. Returns whether it did.
pub fn update_best_score(store: &mut dyn KeyValueStore, score: u32) -> Result<bool, StoreError> {
    let best = load_best_score(store)?;
    if score <= best {
        return Ok(false);
    }
    save(store, BEST_SCORE_KEY, &score)?;
    tracing::info!(score, previous = best, "new best score");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "blockfall-store-{name}-{}-{}",
            std::process::id(),
            now_ms()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn nickname_validation() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(matches!(
            UserProfile::create(" a ", &mut rng),
            Err(StoreError::NicknameTooShort { min: 2 })
        ));
        let profile = UserProfile::create("  kim ", &mut rng).unwrap();
        assert_eq!(profile.display_name, "kim");
        assert!((1000..=9999).contains(&profile.tag));
        assert_eq!(profile.full_display_name, format!("kim#{}", profile.tag));
    }

    #[test]
    fn profile_roundtrip_in_memory() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut store = MemoryStore::new();
        assert!(UserProfile::load(&store).unwrap().is_none());

        let mut profile = UserProfile::create("lee", &mut rng).unwrap();
        profile.record_game(1200, true);
        profile.record_game(300, false);
        profile.save(&mut store).unwrap();

        let loaded = UserProfile::load(&store).unwrap().unwrap();
        assert_eq!(loaded, profile);
        assert_eq!(loaded.stats.total_games, 2);
        assert_eq!(loaded.stats.best_score, 1200);
        assert_eq!(loaded.stats.win_rate(), 50);

        let raw = store.get(USER_KEY).unwrap().unwrap();
        assert!(raw.contains("\"fullDisplayName\""));

        UserProfile::clear(&mut store).unwrap();
        assert!(UserProfile::load(&store).unwrap().is_none());
    }

    #[test]
    fn best_score_only_increases() {
        let mut store = MemoryStore::new();
        assert_eq!(load_best_score(&store).unwrap(), 0);
        assert!(update_best_score(&mut store, 500).unwrap());
        assert!(!update_best_score(&mut store, 400).unwrap());
        assert!(!update_best_score(&mut store, 500).unwrap());
        assert_eq!(load_best_score(&store).unwrap(), 500);
    }

    #[test]
    fn file_store_persists() {
        let dir = temp_dir("persist");
        let mut store = FileStore::new(&dir);
        assert_eq!(store.get(BEST_SCORE_KEY).unwrap(), None);

        update_best_score(&mut store, 4200).unwrap();
        let reopened = FileStore::new(&dir);
        assert_eq!(load_best_score(&reopened).unwrap(), 4200);
        assert!(dir.join("tetris_best_score.json").exists());

        store.remove(BEST_SCORE_KEY).unwrap();
        store.remove(BEST_SCORE_KEY).unwrap();
        assert_eq!(load_best_score(&store).unwrap(), 0);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_store_rejects_path_keys() {
        let store = FileStore::new(temp_dir("keys"));
        assert!(matches!(store.get("../etc"), Err(StoreError::InvalidKey(_))));
    }

    #[test]
    fn malformed_record_is_an_error() {
        let mut store = MemoryStore::new();
        store.set(USER_KEY, "{not json").unwrap();
        assert!(matches!(UserProfile::load(&store), Err(StoreError::Codec(_))));
    }
}
