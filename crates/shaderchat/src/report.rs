use uniforms::{Control, DiscoveredUniform, Editor, GlslType, UniformChange, UniformTable};

pub fn describe_change(change: &UniformChange) -> String {
    match change {
        UniformChange::Added { name, ty } => format!("+ {name} ({ty})"),
        UniformChange::Retagged { name, from, to } => {
            format!("~ {name} retagged {} -> {to}", type_label(*from))
        }
        UniformChange::Reset { name, from, to } => {
            format!("! {name} reset {} -> {to}", type_label(*from))
        }
        UniformChange::Removed { name } => format!("- {name}"),
    }
}

fn type_label(ty: Option<GlslType>) -> String {
    ty.map(|ty| ty.to_string())
        .unwrap_or_else(|| "untyped".to_string())
}

pub fn print_discovered(discovered: &[DiscoveredUniform]) {
    if discovered.is_empty() {
        println!("No custom uniforms declared.");
        return;
    }
    for uniform in discovered {
        println!("  {:<10} {}", uniform.ty.as_str(), uniform.name);
    }
}

pub fn print_table(table: &UniformTable) {
    println!("Uniforms:");
    for (name, uniform) in table.iter() {
        let ty = type_label(uniform.effective_type());
        println!("  {ty:<10} {name:<24} {}", uniform.value);
    }
}

pub fn print_controls(controls: &[Control]) {
    if controls.is_empty() {
        println!("Controls: (none)");
        return;
    }
    println!("Controls:");
    for control in controls {
        let editor = match control.editor {
            Editor::Slider { min, max } => format!("slider [{min}, {max}]"),
            Editor::Color { alpha: false } => "color".to_string(),
            Editor::Color { alpha: true } => "color+alpha".to_string(),
            Editor::Vector => "vector".to_string(),
            Editor::Texture => "texture".to_string(),
        };
        println!("  {:<24} {editor:<16} {}", control.name, control.value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_each_change_kind() {
        assert_eq!(
            describe_change(&UniformChange::Added {
                name: "u_a".into(),
                ty: GlslType::Vec3,
            }),
            "+ u_a (vec3)"
        );
        assert_eq!(
            describe_change(&UniformChange::Reset {
                name: "u_b".into(),
                from: Some(GlslType::Float),
                to: GlslType::Sampler2D,
            }),
            "! u_b reset float -> sampler2D"
        );
        assert_eq!(
            describe_change(&UniformChange::Retagged {
                name: "u_c".into(),
                from: None,
                to: GlslType::Float,
            }),
            "~ u_c retagged untyped -> float"
        );
        assert_eq!(
            describe_change(&UniformChange::Removed { name: "u_d".into() }),
            "- u_d"
        );
    }
}
