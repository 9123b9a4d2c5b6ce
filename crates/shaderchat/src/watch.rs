use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use uniforms::{EditorSession, Publish};

use crate::report::describe_change;
use crate::state::persist_session;

/// Polls a fragment shader file and feeds changes through the session's
/// debouncer.
pub struct Watcher {
    path: PathBuf,
    last_seen: Option<String>,
    session: EditorSession,
    dirty: bool,
}

/// What a single tick did.
#[derive(Debug, Default)]
pub struct Tick {
    pub publish: Option<Publish>,
    /// The session settled on new source and should be written out.
    pub settled: bool,
}

impl Watcher {
    pub fn new(path: impl Into<PathBuf>, session: EditorSession) -> Self {
        Self {
            path: path.into(),
            last_seen: None,
            session,
            dirty: false,
        }
    }

    pub fn session(&self) -> &EditorSession {
        &self.session
    }

    pub fn into_session(mut self) -> EditorSession {
        self.session.teardown();
        self.session
    }

    /// Loads the file once and reconciles it immediately.
    pub fn prime(&mut self) -> Result<Option<Publish>> {
        let source = read_source(&self.path)?;
        let publish = if source != self.session.fragment() {
            self.session.apply_sources(None, Some(&source))
        } else {
            None
        };
        self.dirty = publish.is_some();
        self.last_seen = Some(source);
        Ok(publish)
    }

    pub fn tick(&mut self, now: Instant) -> Tick {
        match read_source(&self.path) {
            Ok(source) => {
                if self.last_seen.as_deref() != Some(source.as_str()) {
                    tracing::debug!(path = %self.path.display(), "fragment shader changed on disk");
                    self.session.edit_fragment(source.clone(), now);
                    self.last_seen = Some(source);
                    self.dirty = true;
                }
            }
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "failed to read fragment shader");
            }
        }

        let publish = self.session.poll(now);
        let settled = self.dirty && !self.session.is_pending();
        if settled {
            self.dirty = false;
        }
        Tick { publish, settled }
    }
}

pub fn run_watch(
    fragment: &Path,
    session: EditorSession,
    session_path: &Path,
    interval: Duration,
    once: bool,
) -> Result<EditorSession> {
    let mut watcher = Watcher::new(fragment, session);
    tracing::info!(
        path = %fragment.display(),
        interval = ?interval,
        "watching fragment shader"
    );

    if let Some(publish) = watcher.prime()? {
        report(&publish);
        persist_session(session_path, watcher.session())?;
        if once {
            return Ok(watcher.into_session());
        }
    }

    loop {
        thread::sleep(interval);
        let tick = watcher.tick(Instant::now());
        if let Some(publish) = &tick.publish {
            report(publish);
        }
        if tick.settled {
            persist_session(session_path, watcher.session())?;
        }
        if once && tick.publish.is_some() {
            return Ok(watcher.into_session());
        }
    }
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("failed to read fragment shader at {}", path.display()))
}

fn report(publish: &Publish) {
    for change in &publish.changes {
        println!("{}", describe_change(change));
    }
}
