//! Owner of the editor's uniform state.
//!
//! `EditorSession` ties the scan, reconcile, and publish steps together for a
//! single editor. Fragment edits are debounced; everything else (loading a
//! history entry, applying an AI suggestion, control edits) runs immediately.
//! Every write replaces the published table in one step so readers never see
//! a half-applied reconciliation.
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::controls::{controls, Control};
use crate::debounce::Debouncer;
use crate::reconcile::{reconcile, UniformChange};
use crate::scan::scan;
use crate::table::{publish, CustomUniforms, UniformTable};
use crate::update::{update_value, UpdateError};
use crate::value::UniformValue;

/// Persistable view of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub vertex: String,
    pub fragment: String,
    #[serde(default)]
    pub uniforms: CustomUniforms,
    pub table: UniformTable,
}

/// Result of a pipeline run that changed the custom mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Publish {
    pub table: UniformTable,
    pub changes: Vec<UniformChange>,
}

#[derive(Debug)]
pub struct EditorSession {
    vertex: String,
    fragment: String,
    custom: CustomUniforms,
    table: UniformTable,
    fragment_edits: Debouncer<String>,
}

impl EditorSession {
    pub fn new(
        vertex: impl Into<String>,
        fragment: impl Into<String>,
        debounce: Duration,
        resolution: (u32, u32),
    ) -> Self {
        let mut session = Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
            custom: CustomUniforms::new(),
            table: UniformTable::new(resolution.0, resolution.1),
            fragment_edits: Debouncer::new(debounce),
        };
        session.reconcile_current();
        session
    }

    /// Rebuilds a session from persisted state and reconciles it against its
    /// own fragment source, repairing anything edited by hand. Only the
    /// built-ins are taken from the stored table; the rest is republished from
    /// the custom mapping.
    pub fn from_snapshot(snapshot: SessionSnapshot, debounce: Duration) -> Self {
        let mut session = Self {
            vertex: snapshot.vertex,
            fragment: snapshot.fragment,
            custom: snapshot.uniforms,
            table: snapshot.table,
            fragment_edits: Debouncer::new(debounce),
        };
        session.reconcile_current();
        session.table = publish(&session.custom, &session.table.built_ins());
        session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            vertex: self.vertex.clone(),
            fragment: self.fragment.clone(),
            uniforms: self.custom.clone(),
            table: self.table.clone(),
        }
    }

    pub fn vertex(&self) -> &str {
        &self.vertex
    }

    pub fn fragment(&self) -> &str {
        &self.fragment
    }

    pub fn custom(&self) -> &CustomUniforms {
        &self.custom
    }

    pub fn table(&self) -> &UniformTable {
        &self.table
    }

    pub fn controls(&self) -> Vec<Control> {
        controls(&self.custom)
    }

    /// Vertex source has no uniform discovery; it goes straight to the renderer.
    pub fn edit_vertex(&mut self, text: impl Into<String>) {
        self.vertex = text.into();
    }

    /// Records a keystroke-level fragment edit. The renderer sees the new
    /// source at once; uniform discovery waits for the debounce window.
    pub fn edit_fragment(&mut self, text: impl Into<String>, now: Instant) {
        let text = text.into();
        self.fragment = text.clone();
        self.fragment_edits.push(text, now);
    }

    pub fn is_pending(&self) -> bool {
        self.fragment_edits.is_pending()
    }

    /// Runs the pipeline if the debounce window for the latest fragment edit
    /// has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<Publish> {
        let source = self.fragment_edits.poll(now)?;
        tracing::debug!(bytes = source.len(), "fragment edit settled");
        self.reconcile_source(&source)
    }

    /// Replaces shader sources wholesale and reconciles immediately. Any
    /// pending debounced edit is superseded.
    pub fn apply_sources(&mut self, vertex: Option<&str>, fragment: Option<&str>) -> Option<Publish> {
        self.fragment_edits.cancel();
        if let Some(vertex) = vertex {
            self.vertex = vertex.to_string();
        }
        if let Some(fragment) = fragment {
            self.fragment = fragment.to_string();
        }
        self.reconcile_current()
    }

    /// Applies a control edit. Returns `false` when the value was already set.
    pub fn update_value(&mut self, name: &str, value: UniformValue) -> Result<bool, UpdateError> {
        match update_value(&self.custom, &self.table, name, value)? {
            Some(update) => {
                self.custom = update.custom;
                self.table = update.table;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn advance_time(&mut self, seconds: f32) {
        self.table = self.table.with_time(seconds);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.table = self.table.with_resolution(width, height);
    }

    /// Cancels any pending debounced run.
    pub fn teardown(&mut self) {
        if self.fragment_edits.cancel() {
            tracing::debug!("discarded pending fragment edit on teardown");
        }
    }

    fn reconcile_current(&mut self) -> Option<Publish> {
        let source = self.fragment.clone();
        self.reconcile_source(&source)
    }

    fn reconcile_source(&mut self, source: &str) -> Option<Publish> {
        let discovered = scan(source);
        let outcome = reconcile(&discovered, &self.custom);
        if !outcome.changed() {
            tracing::trace!(uniforms = discovered.len(), "uniforms unchanged; skipping publish");
            return None;
        }
        let table = publish(&outcome.uniforms, &self.table.built_ins());
        self.custom = outcome.uniforms;
        self.table = table.clone();
        tracing::info!(
            changes = outcome.changes.len(),
            uniforms = self.custom.len(),
            "published uniform table"
        );
        Some(Publish {
            table,
            changes: outcome.changes,
        })
    }
}
