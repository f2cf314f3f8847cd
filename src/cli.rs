//! Command-line editor and service entry points
//!
//! Every command is a thin caller over [`ConfigStore`]; validation lives in the
//! store. Editing commands save once, after the mutation succeeded.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};

use crate::config::backup::BackupManager;
use crate::config::button::{display_chord, parse_chord};
use crate::config::{Button, Chord, Config, Theme};
use crate::constants::input::AVAILABLE_KEYS;
use crate::control::{ControlServer, ControlSurface, Request, Response, default_socket_path};
use crate::input::{InjectorBackendType, create_injector, keymap};
use crate::store::ConfigStore;
use crate::trigger::TriggerEngine;

#[derive(Parser)]
#[command(name = "mobile-deck")]
#[command(version)]
#[command(about = "Macro button deck: profiles, groups and key-chord buttons", long_about = None)]
pub struct Cli {
    /// Config file (default: <config dir>/mobile-deck/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Log key intents instead of typing them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Key injection backend
    #[arg(long, global = true, value_enum, default_value_t)]
    pub backend: InjectorBackendType,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage profiles
    Profile {
        #[command(subcommand)]
        action: ProfileCommand,
    },
    /// Manage groups of a profile
    Group {
        #[command(subcommand)]
        action: GroupCommand,
    },
    /// Manage buttons of a group
    Button {
        #[command(subcommand)]
        action: ButtonCommand,
    },
    /// Show or change grid display preferences
    Prefs(PrefsArgs),
    /// List the known key names
    Keys,
    /// Fire a button of the active group
    Trigger {
        /// Button index within the active group
        index: usize,
        /// Toggle state produced by this press (toggle buttons only fire when on)
        #[arg(long, value_enum)]
        toggle: Option<ToggleState>,
    },
    /// Serve the control surface on a local socket until Ctrl-C
    Serve {
        /// Socket path (default: next to the config file)
        #[arg(long)]
        socket: Option<PathBuf>,
    },
    /// Manage configuration backups
    Backup {
        #[command(subcommand)]
        action: BackupCommand,
    },
}

#[derive(Subcommand)]
pub enum ProfileCommand {
    List,
    Add { name: String },
    Rename { old: String, new: String },
    Delete { name: String },
    /// Make a profile active (selects its first group)
    Use { name: String },
}

#[derive(Subcommand)]
pub enum GroupCommand {
    List {
        /// Profile to list (default: active profile)
        #[arg(long)]
        profile: Option<String>,
    },
    Add {
        name: String,
        #[arg(long)]
        profile: Option<String>,
    },
    Rename {
        old: String,
        new: String,
        #[arg(long)]
        profile: Option<String>,
    },
    Delete {
        name: String,
        #[arg(long)]
        profile: Option<String>,
    },
    /// Make a group of the active profile active
    Use { name: String },
}

/// Group a button command operates on (default: active selection)
#[derive(Args)]
pub struct Target {
    #[arg(long)]
    profile: Option<String>,
    #[arg(long)]
    group: Option<String>,
}

#[derive(Subcommand)]
pub enum ButtonCommand {
    List {
        #[command(flatten)]
        target: Target,
    },
    Add {
        text: String,
        /// Chord as keys joined by '+'; repeat for a sequence (--keys ctrl+c --keys ctrl+v)
        #[arg(long = "keys", required = true)]
        keys: Vec<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        text_color: Option<String>,
        #[arg(long)]
        image: Option<String>,
        /// Remember on/off state between presses
        #[arg(long)]
        toggle: bool,
        #[command(flatten)]
        target: Target,
    },
    Update {
        index: usize,
        #[arg(long)]
        text: Option<String>,
        /// Replaces every chord when given
        #[arg(long = "keys")]
        keys: Vec<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        text_color: Option<String>,
        /// Empty string removes the image
        #[arg(long)]
        image: Option<String>,
        #[arg(long)]
        toggle: Option<bool>,
        #[command(flatten)]
        target: Target,
    },
    Duplicate {
        index: usize,
        #[command(flatten)]
        target: Target,
    },
    Delete {
        index: usize,
        #[command(flatten)]
        target: Target,
    },
}

#[derive(Args)]
pub struct PrefsArgs {
    #[arg(long)]
    theme: Option<Theme>,
    #[arg(long)]
    per_row: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
    #[arg(long)]
    width: Option<u32>,
}

#[derive(Subcommand)]
pub enum BackupCommand {
    Create,
    List,
    /// Restore the config file from a backup in the backups directory
    Restore { filename: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ToggleState {
    On,
    Off,
}

impl Cli {
    pub fn backend_type(&self) -> InjectorBackendType {
        if self.dry_run {
            InjectorBackendType::Log
        } else {
            self.backend
        }
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(Config::path);
    let store = Arc::new(ConfigStore::load(&config_path));
    if let Some(e) = store.load_error() {
        warn!(error = %e, path = %config_path.display(), "Using default configuration");
    }

    let backend = cli.backend_type();
    match cli.command {
        Command::Profile { action } => run_profile(&store, action),
        Command::Group { action } => run_group(&store, action),
        Command::Button { action } => run_button(&store, action),
        Command::Prefs(args) => run_prefs(&store, args),
        Command::Keys => {
            for key in AVAILABLE_KEYS {
                let mapped = if keymap::symbol_to_key_code(key).is_some() {
                    ""
                } else {
                    "  (unmapped)"
                };
                println!("{}{}", key, mapped);
            }
            Ok(())
        }
        Command::Trigger { index, toggle } => {
            let surface = ControlSurface::new(
                store,
                Arc::new(TriggerEngine::new(create_injector(backend)?)),
            );
            let response = surface.handle(Request::Trigger {
                id: index,
                hotkey: Vec::new(),
                sequence: Vec::new(),
                is_toggle: None,
                state: toggle.map(|t| t == ToggleState::On),
            });
            match response {
                Response::Triggered { fired: true, intents } => {
                    println!("Fired {} key events", intents);
                    Ok(())
                }
                Response::Triggered { fired: false, .. } => {
                    println!("Toggle is off, nothing fired");
                    Ok(())
                }
                Response::Error { kind, message } => bail!("{} ({})", message, kind),
                other => bail!("Unexpected response: {:?}", other),
            }
        }
        Command::Serve { socket } => {
            let socket = socket.unwrap_or_else(|| default_socket_path(store.path()));
            let engine = Arc::new(TriggerEngine::new(create_injector(backend)?));
            let surface = ControlSurface::new(store, engine);

            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("Failed to build Tokio runtime")?;
            rt.block_on(async move {
                let server = ControlServer::bind(socket)?;
                server.run(surface).await
            })?;
            info!("Control server stopped");
            Ok(())
        }
        Command::Backup { action } => run_backup(&store, action),
    }
}

fn run_profile(store: &ConfigStore, action: ProfileCommand) -> Result<()> {
    match action {
        ProfileCommand::List => {
            let config = store.snapshot();
            for profile in &config.profiles {
                let marker = if profile.name == config.active_profile {
                    "*"
                } else {
                    " "
                };
                println!("{} {} ({} groups)", marker, profile.name, profile.groups.len());
            }
            return Ok(());
        }
        ProfileCommand::Add { name } => store.add_profile(&name)?,
        ProfileCommand::Rename { old, new } => store.rename_profile(&old, &new)?,
        ProfileCommand::Delete { name } => store.delete_profile(&name)?,
        ProfileCommand::Use { name } => {
            let selection = store.set_active_profile(&name)?;
            println!("{} / {}", selection.active_profile, selection.active_group);
            return Ok(());
        }
    }
    store.save()?;
    Ok(())
}

fn run_group(store: &ConfigStore, action: GroupCommand) -> Result<()> {
    let active_profile = || store.selection().active_profile;
    match action {
        GroupCommand::List { profile } => {
            let config = store.snapshot();
            let name = profile.unwrap_or(config.active_profile.clone());
            let profile = config
                .profile(&name)
                .with_context(|| format!("Profile not found: {}", name))?;
            for group in &profile.groups {
                let marker = if name == config.active_profile && group.name == config.active_group {
                    "*"
                } else {
                    " "
                };
                println!("{} {} ({} buttons)", marker, group.name, group.buttons.len());
            }
            return Ok(());
        }
        GroupCommand::Add { name, profile } => {
            store.add_group(&profile.unwrap_or_else(active_profile), &name)?
        }
        GroupCommand::Rename { old, new, profile } => {
            store.rename_group(&profile.unwrap_or_else(active_profile), &old, &new)?
        }
        GroupCommand::Delete { name, profile } => {
            store.delete_group(&profile.unwrap_or_else(active_profile), &name)?
        }
        GroupCommand::Use { name } => {
            let selection = store.set_active_group(&name)?;
            println!("{} / {}", selection.active_profile, selection.active_group);
            return Ok(());
        }
    }
    store.save()?;
    Ok(())
}

impl Target {
    fn resolve(self, store: &ConfigStore) -> (String, String) {
        let selection = store.selection();
        (
            self.profile.unwrap_or(selection.active_profile),
            self.group.unwrap_or(selection.active_group),
        )
    }
}

fn parse_chords(keys: &[String]) -> Vec<Chord> {
    keys.iter().map(|k| parse_chord(k)).collect()
}

fn run_button(store: &ConfigStore, action: ButtonCommand) -> Result<()> {
    match action {
        ButtonCommand::List { target } => {
            let (profile, group) = target.resolve(store);
            let config = store.snapshot();
            let buttons = config
                .profile(&profile)
                .and_then(|p| p.group(&group))
                .map(|g| g.buttons.as_slice())
                .with_context(|| format!("Group not found: {} / {}", profile, group))?;
            for (index, button) in buttons.iter().enumerate() {
                let toggle = if button.is_toggle { " [toggle]" } else { "" };
                println!(
                    "{:>3}  {}  [{}]{}",
                    index,
                    button.text,
                    button.display_keys(),
                    toggle
                );
            }
            return Ok(());
        }
        ButtonCommand::Add {
            text,
            keys,
            color,
            text_color,
            image,
            toggle,
            target,
        } => {
            let (profile, group) = target.resolve(store);
            let mut button = Button::new(text, parse_chords(&keys));
            if let Some(color) = color {
                button.background_color = color;
            }
            if let Some(text_color) = text_color {
                button.text_color = text_color;
            }
            button.image = image;
            button.is_toggle = toggle;
            let index = store.add_button(&profile, &group, button)?;
            println!("Added button {}", index);
        }
        ButtonCommand::Update {
            index,
            text,
            keys,
            color,
            text_color,
            image,
            toggle,
            target,
        } => {
            let (profile, group) = target.resolve(store);
            let config = store.snapshot();
            let mut button = config
                .profile(&profile)
                .and_then(|p| p.group(&group))
                .and_then(|g| g.buttons.get(index))
                .cloned()
                .with_context(|| format!("No button {} in {} / {}", index, profile, group))?;

            if let Some(text) = text {
                button.text = text;
            }
            if !keys.is_empty() {
                let mut chords = parse_chords(&keys).into_iter();
                button.hotkey = chords.next().unwrap_or_default();
                button.sequence = chords.collect();
            }
            if let Some(color) = color {
                button.background_color = color;
            }
            if let Some(text_color) = text_color {
                button.text_color = text_color;
            }
            if let Some(image) = image {
                button.image = Some(image);
            }
            if let Some(toggle) = toggle {
                button.is_toggle = toggle;
            }
            store.update_button(&profile, &group, index, button)?;
        }
        ButtonCommand::Duplicate { index, target } => {
            let (profile, group) = target.resolve(store);
            let copy = store.duplicate_button(&profile, &group, index)?;
            println!("Added button {}", copy);
        }
        ButtonCommand::Delete { index, target } => {
            let (profile, group) = target.resolve(store);
            let removed = store.delete_button(&profile, &group, index)?;
            println!("Deleted '{}' ({})", removed.text, display_chord(&removed.hotkey));
        }
    }
    store.save()?;
    Ok(())
}

fn run_prefs(store: &ConfigStore, args: PrefsArgs) -> Result<()> {
    let mut preferences = store.preferences();
    let changed = args.theme.is_some()
        || args.per_row.is_some()
        || args.height.is_some()
        || args.width.is_some();

    if changed {
        if let Some(theme) = args.theme {
            preferences.theme = theme;
        }
        if let Some(per_row) = args.per_row {
            preferences.buttons_per_row = per_row;
        }
        if let Some(height) = args.height {
            preferences.button_height = height;
        }
        if let Some(width) = args.width {
            preferences.button_width = width;
        }
        preferences = store.save_preferences(preferences)?;
    }

    println!(
        "{}",
        serde_json::to_string_pretty(&preferences).context("Failed to format preferences")?
    );
    Ok(())
}

fn run_backup(store: &ConfigStore, action: BackupCommand) -> Result<()> {
    let backups = BackupManager::new(store.path());
    match action {
        BackupCommand::Create => {
            if !store.path().exists() {
                store.save()?;
            }
            let path = backups.create_backup(true)?;
            println!("{}", path.display());
        }
        BackupCommand::List => {
            for entry in backups.list_backups()? {
                let time: chrono::DateTime<chrono::Local> = entry.timestamp.into();
                let kind = if entry.is_manual { "manual" } else { "auto" };
                println!(
                    "{}  {:<6}  {}",
                    time.format("%Y-%m-%d %H:%M:%S"),
                    kind,
                    entry.filename
                );
            }
        }
        BackupCommand::Restore { filename } => {
            backups.restore_backup(&filename)?;
            store
                .reload()
                .context("Restored backup does not contain a valid configuration")?;
            println!("Restored {}", filename);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("mobile-deck").chain(args.iter().copied())).unwrap()
    }

    fn temp_cli(dir: &tempfile::TempDir, args: &[&str]) -> Cli {
        let config = dir.path().join("config.json");
        let config = config.to_string_lossy().into_owned();
        let mut full = vec!["--config", config.as_str(), "--dry-run"];
        full.extend_from_slice(args);
        parse(&full)
    }

    #[test]
    fn test_keys_flag_builds_sequence() {
        let cli = parse(&["button", "add", "Copy Paste", "--keys", "ctrl+c", "--keys", "ctrl+v"]);
        let Command::Button {
            action: ButtonCommand::Add { keys, .. },
        } = cli.command
        else {
            panic!("expected button add");
        };
        assert_eq!(
            parse_chords(&keys),
            vec![vec!["ctrl".to_string(), "c".to_string()], vec!["ctrl".to_string(), "v".to_string()]]
        );
    }

    #[test]
    fn test_dry_run_selects_log_backend() {
        assert_eq!(parse(&["--dry-run", "keys"]).backend_type(), InjectorBackendType::Log);
        assert_eq!(parse(&["keys"]).backend_type(), InjectorBackendType::Uinput);
    }

    #[test]
    fn test_editing_commands_persist() {
        let dir = tempfile::tempdir().unwrap();
        run(temp_cli(&dir, &["profile", "add", "Streaming"])).unwrap();
        run(temp_cli(&dir, &["button", "add", "Mute", "--keys", "ctrl+shift+m", "--toggle"]))
            .unwrap();

        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert!(config.profile("Streaming").is_some());
        let button = &config.active_buttons()[0];
        assert_eq!(button.text, "Mute");
        assert!(button.is_toggle);
    }

    #[test]
    fn test_validation_error_exits_without_saving() {
        let dir = tempfile::tempdir().unwrap();
        let err = run(temp_cli(&dir, &["profile", "delete", "Default"])).unwrap_err();
        assert!(err.to_string().contains("last"));
        assert!(!dir.path().join("config.json").exists());
    }

    #[test]
    fn test_trigger_toggle_dry_run() {
        let dir = tempfile::tempdir().unwrap();
        run(temp_cli(&dir, &["button", "add", "Mute", "--keys", "ctrl+m", "--toggle"])).unwrap();

        run(temp_cli(&dir, &["trigger", "0", "--toggle", "on"])).unwrap();
        run(temp_cli(&dir, &["trigger", "0", "--toggle", "off"])).unwrap();
        assert!(run(temp_cli(&dir, &["trigger", "5"])).is_err());
    }
}
