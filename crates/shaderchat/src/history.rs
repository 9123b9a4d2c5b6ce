use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uniforms::{CustomUniforms, EditorSession};

use crate::state::write_json;

/// Saved copy of both shaders and the control values at the time of saving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub name: String,
    pub vertex: String,
    pub fragment: String,
    #[serde(default)]
    pub uniforms: CustomUniforms,
    pub timestamp: DateTime<Utc>,
}

/// Newest-first list of saved shaders, capped at `limit` entries.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    entries: Vec<HistoryEntry>,
    limit: usize,
}

impl HistoryStore {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn load_or_default(path: &Path, limit: usize) -> Result<Self> {
        let mut store = Self::new(limit);
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read history file at {}", path.display()))?;
            store.entries = serde_json::from_str(&contents)
                .with_context(|| format!("failed to parse history file at {}", path.display()))?;
            store.entries.truncate(store.limit);
        }
        Ok(store)
    }

    pub fn persist(&self, path: &Path) -> Result<()> {
        write_json(path, &self.entries, "history")
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn save(&mut self, name: &str, session: &EditorSession) -> Result<&HistoryEntry> {
        self.save_at(name, session, Utc::now())
    }

    fn save_at(
        &mut self,
        name: &str,
        session: &EditorSession,
        timestamp: DateTime<Utc>,
    ) -> Result<&HistoryEntry> {
        let name = checked_name(name)?;
        let entry = HistoryEntry {
            id: generate_id(),
            name,
            vertex: session.vertex().to_string(),
            fragment: session.fragment().to_string(),
            uniforms: session.custom().clone(),
            timestamp,
        };
        self.entries.insert(0, entry);
        if self.entries.len() > self.limit {
            let dropped = self.entries.len() - self.limit;
            self.entries.truncate(self.limit);
            tracing::debug!(dropped, limit = self.limit, "trimmed shader history");
        }
        Ok(&self.entries[0])
    }

    pub fn rename(&mut self, id: &str, name: &str) -> Result<()> {
        let name = checked_name(name)?;
        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                entry.name = name;
                Ok(())
            }
            None => bail!("no history entry with id '{id}'"),
        }
    }

    pub fn delete(&mut self, id: &str) -> Result<HistoryEntry> {
        match self.entries.iter().position(|entry| entry.id == id) {
            Some(index) => Ok(self.entries.remove(index)),
            None => bail!("no history entry with id '{id}'"),
        }
    }
}

fn checked_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        bail!("history entry name must not be empty");
    }
    Ok(trimmed.to_string())
}

fn generate_id() -> String {
    let mut rng = rand::thread_rng();
    format!("{:012x}", rng.gen::<u64>() & 0xffff_ffff_ffff)
}
