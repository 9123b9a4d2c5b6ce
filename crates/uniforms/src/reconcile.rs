use std::collections::HashSet;

use crate::compat::is_compatible;
use crate::scan::DiscoveredUniform;
use crate::table::{is_built_in, CustomUniforms};
use crate::value::{GlslType, Uniform, UniformValue};

/// One decision taken while reconciling a mapping against fresh source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniformChange {
    /// First sighting; the entry holds the type's default.
    Added { name: String, ty: GlslType },
    /// Value kept, only the type tag was rewritten.
    Retagged {
        name: String,
        from: Option<GlslType>,
        to: GlslType,
    },
    /// Declared type changed; the value was reinitialized.
    Reset {
        name: String,
        from: Option<GlslType>,
        to: GlslType,
    },
    /// Declaration disappeared from source.
    Removed { name: String },
}

impl UniformChange {
    pub fn name(&self) -> &str {
        match self {
            UniformChange::Added { name, .. }
            | UniformChange::Retagged { name, .. }
            | UniformChange::Reset { name, .. }
            | UniformChange::Removed { name } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub uniforms: CustomUniforms,
    pub changes: Vec<UniformChange>,
}

impl Reconciliation {
    /// `false` means the mapping is identical to the previous one and callers
    /// must skip publishing it.
    pub fn changed(&self) -> bool {
        !self.changes.is_empty()
    }
}

/// Computes the custom mapping for a freshly scanned shader.
///
/// Entries whose tag already matches are left alone. A tag that is missing or
/// disagrees with the source is rewritten in place when the value still fits
/// the new type; otherwise the value is reset to the type's default. A type
/// change never copies channels across (a `vec3` becoming a `vec4` starts from
/// opaque white), with the single exception of images, which are kept under a
/// sampler tag because they cannot be regenerated.
pub fn reconcile(discovered: &[DiscoveredUniform], previous: &CustomUniforms) -> Reconciliation {
    let mut uniforms = previous.clone();
    let mut changes = Vec::new();

    for DiscoveredUniform { name, ty } in discovered {
        let ty = *ty;
        match uniforms.get_mut(name) {
            None => {
                uniforms.insert(name.clone(), Uniform::declared(ty));
                tracing::debug!(uniform = %name, %ty, "added uniform");
                changes.push(UniformChange::Added {
                    name: name.clone(),
                    ty,
                });
            }
            Some(entry) if entry.ty == Some(ty) => {}
            Some(entry) => {
                let from = entry.ty;
                if is_compatible(&entry.value, ty) {
                    entry.ty = Some(ty);
                    tracing::debug!(uniform = %name, ?from, to = %ty, "retagged uniform");
                    changes.push(UniformChange::Retagged {
                        name: name.clone(),
                        from,
                        to: ty,
                    });
                } else {
                    entry.value = reset_value(&entry.value, ty);
                    entry.ty = Some(ty);
                    tracing::debug!(uniform = %name, ?from, to = %ty, "reset uniform after type change");
                    changes.push(UniformChange::Reset {
                        name: name.clone(),
                        from,
                        to: ty,
                    });
                }
            }
        }
    }

    let declared: HashSet<&str> = discovered.iter().map(|d| d.name.as_str()).collect();
    let stale: Vec<String> = uniforms
        .keys()
        .filter(|name| !declared.contains(name.as_str()) && !is_built_in(name))
        .cloned()
        .collect();
    for name in stale {
        uniforms.remove(&name);
        tracing::debug!(uniform = %name, "removed uniform");
        changes.push(UniformChange::Removed { name });
    }

    Reconciliation { uniforms, changes }
}

fn reset_value(existing: &UniformValue, ty: GlslType) -> UniformValue {
    match (existing, ty) {
        (UniformValue::Image(image), GlslType::Sampler2D) => UniformValue::Image(image.clone()),
        _ => ty.default_value(),
    }
}
