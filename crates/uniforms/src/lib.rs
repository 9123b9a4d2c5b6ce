mod compat;
mod controls;
mod debounce;
mod equality;
mod reconcile;
mod scan;
mod session;
mod table;
mod update;
mod value;

pub use compat::is_compatible;
pub use controls::{controls, Control, Editor};
pub use debounce::Debouncer;
pub use equality::equals;
pub use reconcile::{reconcile, Reconciliation, UniformChange};
pub use scan::{
    discover_uniform_names, scan, uniform_type, DiscoveredUniform, EXCLUDED_UNIFORMS, SCAN_ORDER,
};
pub use session::{EditorSession, Publish, SessionSnapshot};
pub use table::{
    is_built_in, publish, CustomUniforms, UniformTable, BUILT_IN_UNIFORMS, RESOLUTION_UNIFORM,
    TIME_UNIFORM,
};
pub use update::{update_value, UniformUpdate, UpdateError};
pub use value::{GlslType, ImageRef, Rgb, Rgba, Uniform, UniformValue, ValueError, Vec2};
