use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::templates::Template;

#[derive(Parser, Debug)]
#[command(
    name = "shaderchat",
    author,
    version,
    about = "Live GLSL editor backend with uniform discovery and an AI chat sidecar"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the custom uniforms a fragment shader declares.
    Scan {
        #[arg(value_name = "FRAGMENT")]
        fragment: PathBuf,
    },
    /// Load shader sources into the session and reconcile immediately.
    Open {
        #[arg(value_name = "FRAGMENT")]
        fragment: PathBuf,
        /// Replace the vertex shader as well.
        #[arg(long, value_name = "FILE")]
        vertex: Option<PathBuf>,
    },
    /// Reset the session to a starter template.
    Reset {
        #[arg(long, value_enum, default_value_t = Template::Default)]
        template: Template,
    },
    /// Print the published uniform table and the control panel.
    Show {
        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Set a custom uniform from a JSON value (`0.3`, `{"r":1,"g":0,"b":0}`, `null`).
    Set {
        name: String,
        #[arg(value_name = "VALUE", allow_hyphen_values = true)]
        value: String,
    },
    /// Upload an image into a sampler2D uniform.
    Texture {
        name: String,
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
    },
    /// Poll a fragment shader file and reconcile after each debounced edit.
    Watch {
        #[arg(value_name = "FRAGMENT")]
        fragment: PathBuf,
        /// Exit after the first publish.
        #[arg(long)]
        once: bool,
    },
    /// Apply the shader code embedded in a saved assistant reply.
    ApplyReply {
        #[arg(value_name = "FILE")]
        reply: PathBuf,
    },
    /// Manage saved shaders.
    History(HistoryCommand),
    /// Manage chat model endpoints.
    Models(ModelsCommand),
    /// Send a chat message to the selected model. `#vs` and `#fs` inline the
    /// current shaders.
    Ask {
        message: String,
        /// Apply shader code from the reply to the session.
        #[arg(long)]
        apply: bool,
    },
    /// Print or clear the chat transcript.
    Transcript {
        #[arg(long)]
        clear: bool,
    },
    /// Print resolved directories.
    Where,
}

#[derive(Args, Debug)]
pub struct HistoryCommand {
    #[command(subcommand)]
    pub action: HistoryAction,
}

#[derive(Subcommand, Debug)]
pub enum HistoryAction {
    /// Save the current session.
    Save { name: String },
    /// List saved shaders, newest first.
    List,
    /// Restore a saved shader into the session.
    Load { id: String },
    Rename { id: String, name: String },
    Delete { id: String },
}

#[derive(Args, Debug)]
pub struct ModelsCommand {
    #[command(subcommand)]
    pub action: ModelsAction,
}

#[derive(Subcommand, Debug)]
pub enum ModelsAction {
    /// Register a model endpoint and select it.
    Add(AddModelArgs),
    /// Change fields of a stored model; omitted fields keep their value.
    Edit(EditModelArgs),
    List,
    Remove { id: String },
    Select { name: String },
    /// Send a short completion to check the endpoint and key.
    Test { id: String },
}

#[derive(Args, Debug)]
pub struct EditModelArgs {
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub api_key: Option<String>,
}

#[derive(Args, Debug)]
pub struct AddModelArgs {
    #[arg(long)]
    pub name: String,
    /// Base address, e.g. `https://api.openai.com/v1` or `http://localhost:11434`.
    #[arg(long)]
    pub address: String,
    /// Model identifier sent in the request body.
    #[arg(long)]
    pub model: String,
    /// API key; can also be supplied via the `SHADERCHAT_API_KEY` env var.
    #[arg(long, env = "SHADERCHAT_API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,
}

pub fn parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_nested_history_command() {
        let cli = Cli::try_parse_from(["shaderchat", "history", "rename", "abc", "new name"]).unwrap();
        match cli.command {
            Command::History(HistoryCommand {
                action: HistoryAction::Rename { id, name },
            }) => {
                assert_eq!(id, "abc");
                assert_eq!(name, "new name");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn set_accepts_json_objects() {
        let cli = Cli::try_parse_from(["shaderchat", "set", "u_tint", r#"{"r":1,"g":0,"b":0}"#])
            .unwrap();
        assert!(matches!(cli.command, Command::Set { ref value, .. } if value.starts_with('{')));
    }

    #[test]
    fn edit_fields_are_optional() {
        let cli = Cli::try_parse_from(["shaderchat", "models", "edit", "abc", "--model", "gpt-4o"])
            .unwrap();
        match cli.command {
            Command::Models(ModelsCommand {
                action: ModelsAction::Edit(args),
            }) => {
                assert_eq!(args.id, "abc");
                assert_eq!(args.model.as_deref(), Some("gpt-4o"));
                assert!(args.name.is_none() && args.api_key.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
