use crate::compat::is_compatible;
use crate::equality::equals;
use crate::table::{is_built_in, CustomUniforms, UniformTable};
use crate::value::{GlslType, Uniform, UniformValue};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UpdateError {
    #[error("uniform '{0}' is not declared by the current fragment shader")]
    UnknownUniform(String),
    #[error("uniform '{0}' is managed by the renderer and cannot be edited")]
    BuiltIn(String),
    #[error("uniform '{name}' expects a {expected} value, got {got}")]
    TypeMismatch {
        name: String,
        expected: GlslType,
        got: String,
    },
}

/// Replacement state produced by a control edit.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformUpdate {
    pub custom: CustomUniforms,
    pub table: UniformTable,
}

/// Applies a control edit to a custom uniform.
///
/// Returns `Ok(None)` when the new value equals the current one, so callers
/// skip the write entirely.
pub fn update_value(
    custom: &CustomUniforms,
    table: &UniformTable,
    name: &str,
    value: UniformValue,
) -> Result<Option<UniformUpdate>, UpdateError> {
    if is_built_in(name) {
        return Err(UpdateError::BuiltIn(name.to_string()));
    }
    let current = custom
        .get(name)
        .ok_or_else(|| UpdateError::UnknownUniform(name.to_string()))?;

    if let Some(expected) = current.effective_type() {
        let fits = match value {
            UniformValue::Unset => expected == GlslType::Sampler2D,
            _ => is_compatible(&value, expected),
        };
        if !fits {
            return Err(UpdateError::TypeMismatch {
                name: name.to_string(),
                expected,
                got: value
                    .inferred_type()
                    .map(|ty| ty.to_string())
                    .unwrap_or_else(|| "unset".to_string()),
            });
        }
    }

    if equals(&current.value, &value) {
        return Ok(None);
    }

    let uniform = Uniform {
        value,
        ty: current.ty,
    };
    let mut next = custom.clone();
    next.insert(name.to_string(), uniform.clone());
    let table = table.with_entry(name, uniform);
    tracing::debug!(uniform = %name, "updated uniform value");
    Ok(Some(UniformUpdate {
        custom: next,
        table,
    }))
}
