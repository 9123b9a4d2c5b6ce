use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use assist::{
    expand_references, format_instructions, parse_envelope, ChatClient, ChatOptions, ModelConfig,
    ModelStore, Sender, ShaderSuggestion, Transcript,
};
use editorconfig::EditorConfig;
use tracing_subscriber::EnvFilter;
use uniforms::{scan, EditorSession, UniformValue};

use crate::cli::{AddModelArgs, Command, EditModelArgs, HistoryAction, ModelsAction};
use crate::history::HistoryStore;
use crate::paths::AppPaths;
use crate::report::{describe_change, print_controls, print_discovered, print_table};
use crate::state::{fresh_session, load_config, load_session, persist_session, write_json};
use crate::templates::Template;
use crate::texture::import_texture;
use crate::watch::run_watch;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Resolved directories plus the loaded configuration.
struct Workspace {
    paths: AppPaths,
    config: EditorConfig,
}

impl Workspace {
    fn discover() -> Result<Self> {
        let paths = AppPaths::discover()?;
        let config = load_config(&paths.config_file())?;
        tracing::debug!(
            config = %paths.config_dir().display(),
            data = %paths.data_dir().display(),
            cache = %paths.cache_dir().display(),
            debounce = ?config.debounce,
            "resolved shaderchat paths"
        );
        Ok(Self { paths, config })
    }

    fn session(&self) -> Result<EditorSession> {
        load_session(&self.paths.session_file(), &self.config)
    }

    fn save_session(&self, session: &EditorSession) -> Result<()> {
        persist_session(&self.paths.session_file(), session)
    }

    fn history(&self) -> Result<HistoryStore> {
        HistoryStore::load_or_default(&self.paths.history_file(), self.config.history_limit)
    }

    fn models(&self) -> Result<ModelStore> {
        let path = self.paths.models_file();
        ModelStore::load(&path)
            .with_context(|| format!("failed to load models from {}", path.display()))
    }

    fn save_models(&self, store: &ModelStore) -> Result<()> {
        let path = self.paths.models_file();
        store
            .persist(&path)
            .with_context(|| format!("failed to write models to {}", path.display()))
    }

    fn transcript(&self) -> Result<Transcript> {
        let path = self.paths.transcript_file();
        if !path.exists() {
            return Ok(Transcript::new());
        }
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read transcript at {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse transcript at {}", path.display()))
    }

    fn save_transcript(&self, transcript: &Transcript) -> Result<()> {
        write_json(&self.paths.transcript_file(), transcript, "transcript")
    }
}

pub fn run(command: Command) -> Result<()> {
    let workspace = Workspace::discover()?;
    match command {
        Command::Scan { fragment } => run_scan(&fragment),
        Command::Open { fragment, vertex } => run_open(&workspace, &fragment, vertex.as_deref()),
        Command::Reset { template } => run_reset(&workspace, template),
        Command::Show { json } => run_show(&workspace, json),
        Command::Set { name, value } => run_set(&workspace, &name, &value),
        Command::Texture { name, image } => run_texture(&workspace, &name, &image),
        Command::Watch { fragment, once } => {
            let session = workspace.session()?;
            let session = run_watch(
                &fragment,
                session,
                &workspace.paths.session_file(),
                workspace.config.watch_interval,
                once,
            )?;
            workspace.save_session(&session)
        }
        Command::ApplyReply { reply } => run_apply_reply(&workspace, &reply),
        Command::History(history) => run_history(&workspace, history.action),
        Command::Models(models) => run_models(&workspace, models.action),
        Command::Ask { message, apply } => run_ask(&workspace, &message, apply),
        Command::Transcript { clear } => run_transcript(&workspace, clear),
        Command::Where => run_where(&workspace),
    }
}

fn run_scan(fragment: &Path) -> Result<()> {
    let source = read_shader(fragment)?;
    print_discovered(&scan(&source));
    Ok(())
}

fn run_open(workspace: &Workspace, fragment: &Path, vertex: Option<&Path>) -> Result<()> {
    let fragment_source = read_shader(fragment)?;
    let vertex_source = vertex.map(read_shader).transpose()?;
    let mut session = workspace.session()?;
    match session.apply_sources(vertex_source.as_deref(), Some(&fragment_source)) {
        Some(publish) => {
            for change in &publish.changes {
                println!("{}", describe_change(change));
            }
        }
        None => println!("Uniforms unchanged."),
    }
    workspace.save_session(&session)
}

fn run_reset(workspace: &Workspace, template: Template) -> Result<()> {
    let session = fresh_session(template, &workspace.config);
    workspace.save_session(&session)?;
    println!("Session reset to the {template:?} template.");
    Ok(())
}

fn run_show(workspace: &Workspace, json: bool) -> Result<()> {
    let session = workspace.session()?;
    if json {
        let payload = serde_json::json!({
            "table": session.table(),
            "controls": session.controls(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        print_table(session.table());
        print_controls(&session.controls());
    }
    Ok(())
}

fn run_set(workspace: &Workspace, name: &str, raw: &str) -> Result<()> {
    let json: serde_json::Value =
        serde_json::from_str(raw).with_context(|| format!("value '{raw}' is not valid JSON"))?;
    let value = UniformValue::from_json(&json)?;
    update_and_save(workspace, name, value)
}

fn run_texture(workspace: &Workspace, name: &str, image: &Path) -> Result<()> {
    let texture = import_texture(image)?;
    update_and_save(workspace, name, UniformValue::Image(texture))
}

fn update_and_save(workspace: &Workspace, name: &str, value: UniformValue) -> Result<()> {
    let mut session = workspace.session()?;
    let display = value.to_string();
    if session.update_value(name, value)? {
        workspace.save_session(&session)?;
        println!("{name} = {display}");
    } else {
        println!("{name} unchanged");
    }
    Ok(())
}

fn run_apply_reply(workspace: &Workspace, reply: &Path) -> Result<()> {
    let text = fs::read_to_string(reply)
        .with_context(|| format!("failed to read reply at {}", reply.display()))?;
    let Some(suggestion) = parse_envelope(&text)? else {
        bail!("reply at {} contains no format block", reply.display());
    };
    let mut session = workspace.session()?;
    apply_suggestion(&mut session, &suggestion)?;
    workspace.save_session(&session)
}

fn apply_suggestion(session: &mut EditorSession, suggestion: &ShaderSuggestion) -> Result<()> {
    if !suggestion.has_code() {
        bail!("suggestion contains no shader code");
    }
    if !suggestion.description.is_empty() {
        println!("{}", suggestion.description);
    }
    for change in &suggestion.changes {
        println!("  - {change}");
    }
    let publish = session.apply_sources(suggestion.vertex.as_deref(), suggestion.fragment.as_deref());
    if let Some(publish) = publish {
        for change in &publish.changes {
            println!("{}", describe_change(change));
        }
    }
    tracing::info!(
        vertex = suggestion.vertex.is_some(),
        fragment = suggestion.fragment.is_some(),
        "applied assistant suggestion"
    );
    Ok(())
}

fn run_history(workspace: &Workspace, action: HistoryAction) -> Result<()> {
    let path = workspace.paths.history_file();
    let mut history = workspace.history()?;
    match action {
        HistoryAction::Save { name } => {
            let session = workspace.session()?;
            let entry = history.save(&name, &session)?;
            println!("Saved '{}' as {}", entry.name, entry.id);
            history.persist(&path)
        }
        HistoryAction::List => {
            if history.entries().is_empty() {
                println!("No saved shaders.");
            }
            for entry in history.entries() {
                println!(
                    "  {}  {}  {:<24} {} uniforms",
                    entry.id,
                    entry.timestamp.format("%Y-%m-%d %H:%M"),
                    entry.name,
                    entry.uniforms.len()
                );
            }
            Ok(())
        }
        HistoryAction::Load { id } => {
            let Some(entry) = history.get(&id) else {
                bail!("no history entry with id '{id}'");
            };
            let mut session = workspace.session()?;
            session.apply_sources(Some(&entry.vertex), Some(&entry.fragment));
            for (name, uniform) in &entry.uniforms {
                if let Err(err) = session.update_value(name, uniform.value.clone()) {
                    tracing::debug!(uniform = %name, error = %err, "skipped saved value");
                }
            }
            workspace.save_session(&session)?;
            println!("Loaded '{}'", entry.name);
            Ok(())
        }
        HistoryAction::Rename { id, name } => {
            history.rename(&id, &name)?;
            history.persist(&path)
        }
        HistoryAction::Delete { id } => {
            let removed = history.delete(&id)?;
            println!("Deleted '{}'", removed.name);
            history.persist(&path)
        }
    }
}

fn run_models(workspace: &Workspace, action: ModelsAction) -> Result<()> {
    let mut store = workspace.models()?;
    match action {
        ModelsAction::Add(AddModelArgs {
            name,
            address,
            model,
            api_key,
        }) => {
            let added = store.add(ModelConfig::new(name, address, model, api_key))?;
            println!("Added model '{}' ({})", added.name, added.id);
            workspace.save_models(&store)
        }
        ModelsAction::List => {
            if store.models().is_empty() {
                println!("No models configured.");
            }
            let selected = store.selected().map(|model| model.id.clone());
            for model in store.models() {
                let marker = if selected.as_deref() == Some(model.id.as_str()) {
                    '*'
                } else {
                    ' '
                };
                println!(
                    "{marker} {}  {:<16} {:<20} {}  key={}",
                    model.id,
                    model.name,
                    model.model,
                    model.address,
                    model.masked_key()
                );
            }
            Ok(())
        }
        ModelsAction::Edit(EditModelArgs {
            id,
            name,
            address,
            model,
            api_key,
        }) => {
            let mut edited = store
                .get(&id)
                .cloned()
                .with_context(|| format!("no model with id '{id}'"))?;
            if let Some(name) = name {
                edited.name = name.trim().to_string();
            }
            if let Some(address) = address {
                edited.address = address;
            }
            if let Some(model) = model {
                edited.model = model;
            }
            if let Some(api_key) = api_key {
                edited.api_key = api_key;
            }
            let name = edited.name.clone();
            store.update(edited)?;
            println!("Updated model '{name}'");
            workspace.save_models(&store)
        }
        ModelsAction::Test { id } => {
            let model = store
                .get(&id)
                .with_context(|| format!("no model with id '{id}'"))?;
            let reply = chat_client(workspace)?
                .complete(model, "Reply with the single word OK.")
                .with_context(|| format!("model '{}' did not respond", model.name))?;
            println!("Model '{}' responded: {}", model.name, reply.trim());
            Ok(())
        }
        ModelsAction::Remove { id } => {
            let removed = store.remove(&id)?;
            println!("Removed model '{}'", removed.name);
            workspace.save_models(&store)
        }
        ModelsAction::Select { name } => {
            store.select(&name)?;
            workspace.save_models(&store)
        }
    }
}

fn run_ask(workspace: &Workspace, message: &str, apply: bool) -> Result<()> {
    let mut session = workspace.session()?;
    let store = workspace.models()?;
    let model = workspace
        .config
        .chat
        .selected_model
        .as_deref()
        .and_then(|name| store.find_by_name(name))
        .or_else(|| store.selected());

    let client = chat_client(workspace)?.with_system_prompt(format_instructions());
    let prompt = expand_references(message, session.vertex(), session.fragment());

    let mut transcript = workspace.transcript()?;
    let reply = transcript
        .exchange(message, model, |model| client.complete(model, &prompt))
        .clone();
    workspace.save_transcript(&transcript)?;
    println!("{}", reply.text);

    if apply {
        match &reply.suggestion {
            Some(suggestion) if suggestion.has_code() => {
                apply_suggestion(&mut session, suggestion)?;
                workspace.save_session(&session)?;
            }
            _ => println!("Reply contains no shader code to apply."),
        }
    }
    Ok(())
}

fn chat_client(workspace: &Workspace) -> Result<ChatClient> {
    let options = ChatOptions {
        max_tokens: workspace.config.chat.max_tokens,
        temperature: workspace.config.chat.temperature,
    };
    ChatClient::new(options).context("failed to construct chat client")
}

fn run_transcript(workspace: &Workspace, clear: bool) -> Result<()> {
    let mut transcript = workspace.transcript()?;
    if clear {
        transcript.clear();
        return workspace.save_transcript(&transcript);
    }
    for message in transcript.messages() {
        let who = match message.sender {
            Sender::User => "you",
            Sender::Assistant => "assistant",
        };
        println!("[{who}] {}", message.text);
    }
    Ok(())
}

fn run_where(workspace: &Workspace) -> Result<()> {
    let paths = &workspace.paths;
    println!("Configuration directories:");
    println!("  config:     {}", paths.config_dir().display());
    println!("  data:       {}", paths.data_dir().display());
    println!("  cache:      {}", paths.cache_dir().display());
    println!("Files:");
    println!("  config:     {}", paths.config_file().display());
    println!("  models:     {}", paths.models_file().display());
    println!("  session:    {}", paths.session_file().display());
    println!("  history:    {}", paths.history_file().display());
    println!("  transcript: {}", paths.transcript_file().display());
    Ok(())
}

fn read_shader(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read shader at {}", path.display()))
}
