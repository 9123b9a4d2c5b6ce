use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use editorconfig::EditorConfig;
use uniforms::{EditorSession, SessionSnapshot};

use crate::templates::Template;

pub fn load_config(path: &Path) -> Result<EditorConfig> {
    if path.exists() {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file at {}", path.display()))?;
        let config = EditorConfig::from_toml_str(&contents)
            .with_context(|| format!("failed to parse config file at {}", path.display()))?;
        Ok(config)
    } else {
        Ok(EditorConfig::default())
    }
}

/// Loads the persisted session, or starts one from the default template.
pub fn load_session(path: &Path, config: &EditorConfig) -> Result<EditorSession> {
    if path.exists() {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read session file at {}", path.display()))?;
        let snapshot: SessionSnapshot = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse session file at {}", path.display()))?;
        Ok(EditorSession::from_snapshot(snapshot, config.debounce))
    } else {
        Ok(fresh_session(Template::default(), config))
    }
}

pub fn fresh_session(template: Template, config: &EditorConfig) -> EditorSession {
    let (vertex, fragment) = template.sources();
    EditorSession::new(vertex, fragment, config.debounce, config.resolution())
}

pub fn persist_session(path: &Path, session: &EditorSession) -> Result<()> {
    write_json(path, &session.snapshot(), "session")
}

pub(crate) fn write_json<T: serde::Serialize>(path: &Path, value: &T, what: &str) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| anyhow!("{what} path has no parent: {}", path.display()))?;
    fs::create_dir_all(dir).with_context(|| {
        format!(
            "failed to prepare directory for {what} file at {}",
            dir.display()
        )
    })?;
    let serialized = serde_json::to_string_pretty(value)
        .with_context(|| format!("failed to serialize {what} file to JSON"))?;
    fs::write(path, serialized)
        .with_context(|| format!("failed to write {what} file to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;
    use uniforms::UniformValue;

    #[test]
    fn missing_files_fall_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, EditorConfig::default());

        let session = load_session(&dir.path().join("session.json"), &config).unwrap();
        assert!(session.custom().contains_key("u_scale"));
        assert!(session.custom().contains_key("u_custom_float"));
    }

    #[test]
    fn config_file_is_validated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "debounce = \"100ms\"").unwrap();
        assert_eq!(
            load_config(&path).unwrap().debounce,
            Duration::from_millis(100)
        );

        fs::write(&path, "history_limit = 0").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn session_survives_a_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/session.json");
        let config = EditorConfig::default();
        let mut session = fresh_session(Template::Colors, &config);
        session.update_value("u_scale", UniformValue::Float(0.2)).unwrap_err();
        session
            .update_value(
                "uAccentColor",
                UniformValue::from_json(&serde_json::json!({"r": 1.0, "g": 0.0, "b": 0.0}))
                    .unwrap(),
            )
            .unwrap();
        persist_session(&path, &session).unwrap();

        let restored = load_session(&path, &config).unwrap();
        assert_eq!(restored.snapshot(), session.snapshot());
    }

    #[test]
    fn corrupt_session_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();
        assert!(load_session(&path, &EditorConfig::default()).is_err());
    }
}
