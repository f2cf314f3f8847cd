//! Profile-based configuration tree with JSON persistence
//!
//! A config holds one or more named profiles, each containing one or more named
//! groups of buttons, plus the active selection and display preferences.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::button::Button;
use crate::config::preferences::Preferences;
use crate::constants::{config as paths, defaults};
use crate::error::{StoreError, StoreResult};

/// A named page of buttons within a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    #[serde(default)]
    pub buttons: Vec<Button>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            buttons: Vec::new(),
        }
    }

    pub fn default_group() -> Self {
        Self::new(defaults::store::GROUP_NAME)
    }
}

/// Profile - a user context ("Streaming", "Gaming") holding groups of buttons
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub groups: Vec<Group>,
}

impl Profile {
    /// Create a new profile containing a single empty "Main" group
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            groups: vec![Group::default_group()],
        }
    }

    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.name == name)
    }

    pub fn group_mut(&mut self, name: &str) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.name == name)
    }

    pub fn first_group_name(&self) -> Option<&str> {
        self.groups.first().map(|g| g.name.as_str())
    }
}

/// Top-level persisted configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default = "default_profiles")]
    pub profiles: Vec<Profile>,
    #[serde(alias = "active_profile", default = "default_profile_name")]
    pub active_profile: String,
    #[serde(alias = "active_group", default = "default_group_name")]
    pub active_group: String,
    #[serde(alias = "default_preferences", default)]
    pub default_preferences: Preferences,
}

fn default_profiles() -> Vec<Profile> {
    vec![Profile::new(defaults::store::PROFILE_NAME)]
}

fn default_profile_name() -> String {
    defaults::store::PROFILE_NAME.to_string()
}

fn default_group_name() -> String {
    defaults::store::GROUP_NAME.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profiles: default_profiles(),
            active_profile: default_profile_name(),
            active_group: default_group_name(),
            default_preferences: Preferences::default(),
        }
    }
}

impl Config {
    /// Default location: `$MOBILE_DECK_CONFIG_DIR/config.json`, falling back to
    /// `<XDG config>/mobile-deck/config.json`
    pub fn path() -> PathBuf {
        let mut path = match std::env::var_os(paths::DIR_ENV_VAR) {
            Some(dir) => PathBuf::from(dir),
            None => {
                let mut dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
                dir.push(paths::APP_DIR);
                dir
            }
        };
        path.push(paths::FILENAME);
        path
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    pub fn profile_mut(&mut self, name: &str) -> Option<&mut Profile> {
        self.profiles.iter_mut().find(|p| p.name == name)
    }

    /// Buttons of the selected group, or an empty slice if the selection does not resolve
    pub fn active_buttons(&self) -> &[Button] {
        self.profile(&self.active_profile)
            .and_then(|p| p.group(&self.active_group))
            .map(|g| g.buttons.as_slice())
            .unwrap_or(&[])
    }

    /// Load configuration from a JSON file
    ///
    /// A missing file yields the default config. An unparsable or structurally
    /// invalid file yields `CorruptConfig`; callers decide how to recover.
    pub fn load_from(path: &Path) -> StoreResult<Self> {
        if !path.exists() {
            info!(path = ?path, "Config file not found, using default config");
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path).map_err(|e| StoreError::CorruptConfig {
            path: path.to_path_buf(),
            reason: format!("unreadable: {}", e),
        })?;

        let corrupt = |e: serde_json::Error| StoreError::CorruptConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };
        let mut value: serde_json::Value = serde_json::from_str(&contents).map_err(corrupt)?;
        if migrate_flat_buttons(&mut value) {
            info!(path = ?path, "Migrated flat button list into the default profile");
        }
        let mut config: Config = serde_json::from_value(value).map_err(corrupt)?;

        config
            .validate_and_repair()
            .map_err(|reason| StoreError::CorruptConfig {
                path: path.to_path_buf(),
                reason,
            })?;

        info!(
            path = ?path,
            profiles = config.profiles.len(),
            "Loaded config"
        );
        Ok(config)
    }

    /// Save configuration to a JSON file atomically (write temp file, then rename)
    pub fn save_to(&self, path: &Path) -> StoreResult<()> {
        let io_err = |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json_string = serde_json::to_string_pretty(self)
            .map_err(|e| io_err(std::io::Error::other(e)))?;

        let temp_path = sibling_path(path, paths::TEMP_SUFFIX);
        fs::write(&temp_path, json_string).map_err(io_err)?;
        if let Err(e) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(io_err(e));
        }

        info!(path = ?path, "Saved config");
        Ok(())
    }

    /// Move an unparsable config aside so a later save cannot overwrite it
    /// Returns the quarantine path on success.
    pub fn quarantine(path: &Path) -> Option<PathBuf> {
        if !path.exists() {
            return None;
        }

        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
        let target = sibling_path(path, &format!("{}-{}", paths::CORRUPT_INFIX, timestamp));

        match fs::rename(path, &target) {
            Ok(()) => {
                warn!(from = ?path, to = ?target, "Moved corrupt config aside");
                Some(target)
            }
            Err(e) => {
                warn!(path = ?path, error = %e, "Failed to move corrupt config aside");
                None
            }
        }
    }

    /// Check the structural invariants and repair what can be repaired
    ///
    /// Errors (returned as a reason string) for: no profiles, duplicate profile
    /// names, duplicate group names within a profile, buttons without text or keys.
    /// Repairs: profiles without groups get an empty default group, and a
    /// selection that does not resolve is moved to the first profile/group.
    pub fn validate_and_repair(&mut self) -> Result<(), String> {
        if self.profiles.is_empty() {
            return Err("config contains no profiles".to_string());
        }

        let mut profile_names = HashSet::new();
        for profile in &mut self.profiles {
            if profile.name.trim().is_empty() {
                return Err("profile with empty name".to_string());
            }
            if !profile_names.insert(profile.name.clone()) {
                return Err(format!("duplicate profile name '{}'", profile.name));
            }

            if profile.groups.is_empty() {
                warn!(profile = %profile.name, "Profile has no groups, adding default group");
                profile.groups.push(Group::default_group());
            }

            let mut group_names = HashSet::new();
            for group in &profile.groups {
                if group.name.trim().is_empty() {
                    return Err(format!("group with empty name in profile '{}'", profile.name));
                }
                if !group_names.insert(group.name.as_str()) {
                    return Err(format!(
                        "duplicate group name '{}' in profile '{}'",
                        group.name, profile.name
                    ));
                }
                for (index, button) in group.buttons.iter().enumerate() {
                    if button.text.trim().is_empty() {
                        return Err(format!(
                            "button {} in group '{}' has no text",
                            index, group.name
                        ));
                    }
                    if !button.has_keys() {
                        return Err(format!(
                            "button '{}' in group '{}' has no keys",
                            button.text, group.name
                        ));
                    }
                }
            }
        }

        self.repair_selection();
        Ok(())
    }

    /// Point the selection at an existing profile and group
    /// Returns true if anything changed.
    pub fn repair_selection(&mut self) -> bool {
        let mut changed = false;

        if self.profile(&self.active_profile).is_none()
            && let Some(first) = self.profiles.first()
        {
            warn!(
                profile = %self.active_profile,
                "Active profile does not exist, selecting first profile"
            );
            self.active_profile = first.name.clone();
            changed = true;
        }

        let first_group = match self.profile(&self.active_profile) {
            Some(profile) if profile.group(&self.active_group).is_none() => {
                profile.first_group_name().map(str::to_string)
            }
            _ => None,
        };

        if let Some(first) = first_group {
            if !changed {
                warn!(
                    group = %self.active_group,
                    "Active group does not exist, selecting first group"
                );
            }
            self.active_group = first;
            changed = true;
        }

        changed
    }
}

/// Fold a pre-profile `buttons` list into `Default` / `Main`
/// Only applies when the file has no `profiles` key. Returns true if migrated.
fn migrate_flat_buttons(value: &mut serde_json::Value) -> bool {
    let Some(root) = value.as_object_mut() else {
        return false;
    };
    if root.contains_key("profiles") {
        return false;
    }
    let Some(buttons) = root.remove("buttons") else {
        return false;
    };

    root.insert(
        "profiles".to_string(),
        serde_json::json!([{
            "name": defaults::store::PROFILE_NAME,
            "groups": [{
                "name": defaults::store::GROUP_NAME,
                "buttons": buttons,
            }],
        }]),
    );
    true
}

/// `config.json` + `suffix` -> `config.json.suffix`
pub(crate) fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| paths::FILENAME.into());
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}
