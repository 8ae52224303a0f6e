use std::path::{
    Path,
    PathBuf,
};

use serde::{
    Deserialize,
    Serialize,
};

use crate::{
    core::LearnError,
    persistence::{
        self,
        FileStore,
    },
};

pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSettings {
    pub base_url: String,
    pub api_key: String,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self { base_url: "http://localhost:54321".to_string(), api_key: String::new() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameSettings {
    pub reveal_seconds: u32,
    pub round_size: usize,
    pub unlock_score: u32,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self { reveal_seconds: 10, round_size: 5, unlock_score: 4 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub remote: RemoteSettings,
    pub game: GameSettings,
    pub log_filter: String,
    pub data_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            remote: RemoteSettings::default(),
            game: GameSettings::default(),
            log_filter: "learnstrat=info".to_string(),
            data_dir: None,
        }
    }
}

impl Settings {
    pub fn load() -> Self {
        persistence::load_json_or_default(SETTINGS_FILE)
    }

    pub fn save(&self) -> Result<(), LearnError> {
        persistence::save_json(self, SETTINGS_FILE)
    }

    /// Missing or unreadable files fall back to defaults.
    pub fn load_from(path: &Path) -> Self {
        persistence::load_json_or_default_from(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), LearnError> {
        persistence::save_json_to(self, path)
    }

    /// Local store for journal data, honouring the `data_dir` override.
    pub fn local_store(&self) -> FileStore {
        match &self.data_dir {
            Some(dir) => FileStore::new(dir.clone()),
            None => FileStore::in_app_data_dir(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_fill_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{ "game": { "reveal_seconds": 5 } }"#).unwrap();
        assert_eq!(settings.game.reveal_seconds, 5);
        assert_eq!(settings.game.round_size, 5);
        assert_eq!(settings.game.unlock_score, 4);
        assert_eq!(settings.remote, RemoteSettings::default());
        assert_eq!(settings.log_filter, "learnstrat=info");
    }

    #[test]
    fn test_save_and_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        assert_eq!(Settings::load_from(&path), Settings::default());

        let mut settings = Settings::default();
        settings.remote.api_key = "anon-key".to_string();
        settings.game.round_size = 3;
        settings.log_filter = "learnstrat=debug".to_string();
        settings.save_to(&path).unwrap();

        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn test_corrupt_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());

        let missing_dir = dir.path().join("missing").join(SETTINGS_FILE);
        assert!(Settings::default().save_to(&missing_dir).is_err());
    }

    #[test]
    fn test_data_dir_override() {
        let settings = Settings { data_dir: Some(PathBuf::from("/tmp/x")), ..Settings::default() };
        assert_eq!(settings.local_store().root(), &PathBuf::from("/tmp/x"));
    }
}
