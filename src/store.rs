//! Configuration store service
//!
//! Owns the profile/group/button tree and the active selection. Constructed once
//! at startup and shared by handle; every operation takes the same lock, so a
//! save can never persist a half-applied mutation.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::backup::BackupManager;
use crate::config::{Button, Config, Group, Preferences, Profile};
use crate::constants::config::backup;
use crate::error::{ItemKind, StoreError, StoreResult};

/// Names of the currently selected profile and group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub active_profile: String,
    pub active_group: String,
}

/// Buttons of the active group together with the revision they were read at
#[derive(Debug, Clone)]
pub struct ActiveView {
    pub revision: u64,
    pub buttons: Vec<Button>,
}

struct StoreState {
    config: Config,
    /// Bumped whenever the selection or the contents of the active group change
    revision: u64,
}

impl StoreState {
    fn is_active(&self, profile: &str, group: &str) -> bool {
        self.config.active_profile == profile && self.config.active_group == group
    }
}

pub struct ConfigStore {
    path: PathBuf,
    state: Mutex<StoreState>,
    load_error: Option<StoreError>,
}

impl ConfigStore {
    /// Load the store from `path`
    ///
    /// Never fails: a corrupt file is moved aside and replaced by the default
    /// store. The recovered error stays available through [`Self::load_error`].
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (config, load_error) = match Config::load_from(&path) {
            Ok(config) => (config, None),
            Err(e) => {
                error!(error = %e, "Failed to load config, falling back to defaults");
                Config::quarantine(&path);
                (Config::default(), Some(e))
            }
        };

        Self::with_config(path, config, load_error)
    }

    fn with_config(path: PathBuf, config: Config, load_error: Option<StoreError>) -> Self {
        Self {
            path,
            state: Mutex::new(StoreState {
                config,
                revision: 0,
            }),
            load_error,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Error recovered from during [`Self::load`], if any
    pub fn load_error(&self) -> Option<&StoreError> {
        self.load_error.as_ref()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a validated mutation; `f` returns its result plus whether the active group was touched
    fn mutate<T>(&self, f: impl FnOnce(&mut Config) -> StoreResult<(T, bool)>) -> StoreResult<T> {
        let mut state = self.lock();
        let (value, touches_active) = f(&mut state.config)?;
        if touches_active {
            state.revision += 1;
        }
        Ok(value)
    }

    /// Re-read the config file, replacing the in-memory tree
    /// On failure the current tree is kept.
    pub fn reload(&self) -> StoreResult<()> {
        let config = Config::load_from(&self.path)?;
        let mut state = self.lock();
        state.config = config;
        state.revision += 1;
        info!(path = ?self.path, "Reloaded config");
        Ok(())
    }

    /// Persist the full tree, preferences and selection
    pub fn save(&self) -> StoreResult<()> {
        let state = self.lock();
        self.save_locked(&state.config)
    }

    fn save_locked(&self, config: &Config) -> StoreResult<()> {
        if self.path.exists() {
            let backups = BackupManager::new(&self.path);
            if backups.should_run_auto_backup(backup::AUTO_INTERVAL_DAYS) {
                if let Err(e) = backups.create_backup(false) {
                    warn!(error = %e, "Automatic backup failed");
                } else if let Err(e) = backups.prune_backups(backup::AUTO_RETENTION) {
                    warn!(error = %e, "Failed to prune old backups");
                }
            }
        }

        config.save_to(&self.path)
    }

    /// Consistent copy of the whole tree
    pub fn snapshot(&self) -> Config {
        self.lock().config.clone()
    }

    pub fn selection(&self) -> Selection {
        let state = self.lock();
        Selection {
            active_profile: state.config.active_profile.clone(),
            active_group: state.config.active_group.clone(),
        }
    }

    /// Consistent copy of the whole tree with the revision it was taken at
    /// Selection, names and active buttons all come from one lock acquisition.
    pub fn versioned_snapshot(&self) -> (u64, Config) {
        let state = self.lock();
        (state.revision, state.config.clone())
    }

    /// Buttons of the active group (empty if the selection does not resolve)
    /// together with the revision they were read at
    pub fn active_view(&self) -> ActiveView {
        let state = self.lock();
        ActiveView {
            revision: state.revision,
            buttons: state.config.active_buttons().to_vec(),
        }
    }

    pub fn preferences(&self) -> Preferences {
        self.lock().config.default_preferences
    }

    /// Replace display preferences (clamped to renderable limits) and persist
    pub fn save_preferences(&self, preferences: Preferences) -> StoreResult<Preferences> {
        let mut state = self.lock();
        let preferences = preferences.clamped();
        state.config.default_preferences = preferences;
        self.save_locked(&state.config)?;
        info!(?preferences, "Preferences saved");
        Ok(preferences)
    }

    // Profiles

    pub fn add_profile(&self, name: &str) -> StoreResult<()> {
        let name = clean_name(name, ItemKind::Profile)?;
        self.mutate(|config| {
            if config.profile(&name).is_some() {
                return Err(StoreError::duplicate(ItemKind::Profile, name));
            }
            info!(profile = %name, "Adding profile");
            config.profiles.push(Profile::new(name));
            Ok(((), false))
        })
    }

    pub fn rename_profile(&self, old: &str, new: &str) -> StoreResult<()> {
        let new = clean_name(new, ItemKind::Profile)?;
        self.mutate(|config| {
            if config.profile(old).is_none() {
                return Err(StoreError::not_found(ItemKind::Profile, old));
            }
            if new == old {
                return Ok(((), false));
            }
            if config.profile(&new).is_some() {
                return Err(StoreError::duplicate(ItemKind::Profile, new));
            }

            info!(from = %old, to = %new, "Renaming profile");
            let was_active = config.active_profile == old;
            if let Some(profile) = config.profile_mut(old) {
                profile.name = new.clone();
            }
            if was_active {
                config.active_profile = new;
            }
            Ok(((), was_active))
        })
    }

    pub fn delete_profile(&self, name: &str) -> StoreResult<()> {
        self.mutate(|config| {
            let index = config
                .profiles
                .iter()
                .position(|p| p.name == name)
                .ok_or_else(|| StoreError::not_found(ItemKind::Profile, name))?;
            if config.profiles.len() <= 1 {
                return Err(StoreError::LastItemProtected {
                    kind: ItemKind::Profile,
                });
            }

            info!(profile = %name, "Deleting profile");
            config.profiles.remove(index);

            let was_active = config.active_profile == name;
            if was_active {
                let first = &config.profiles[0];
                config.active_profile = first.name.clone();
                config.active_group = first.first_group_name().unwrap_or_default().to_string();
                info!(
                    profile = %config.active_profile,
                    group = %config.active_group,
                    "Active profile deleted, selection moved"
                );
            }
            Ok(((), was_active))
        })
    }

    // Groups

    pub fn add_group(&self, profile: &str, name: &str) -> StoreResult<()> {
        let name = clean_name(name, ItemKind::Group)?;
        self.mutate(|config| {
            let target = config
                .profile_mut(profile)
                .ok_or_else(|| StoreError::not_found(ItemKind::Profile, profile))?;
            if target.group(&name).is_some() {
                return Err(StoreError::duplicate(ItemKind::Group, name));
            }
            info!(profile = %profile, group = %name, "Adding group");
            target.groups.push(Group::new(name));
            Ok(((), false))
        })
    }

    pub fn rename_group(&self, profile: &str, old: &str, new: &str) -> StoreResult<()> {
        let new = clean_name(new, ItemKind::Group)?;
        self.mutate(|config| {
            let is_active_profile = config.active_profile == profile;
            let target = config
                .profile_mut(profile)
                .ok_or_else(|| StoreError::not_found(ItemKind::Profile, profile))?;
            if target.group(old).is_none() {
                return Err(StoreError::not_found(ItemKind::Group, old));
            }
            if new == old {
                return Ok(((), false));
            }
            if target.group(&new).is_some() {
                return Err(StoreError::duplicate(ItemKind::Group, new));
            }

            info!(profile = %profile, from = %old, to = %new, "Renaming group");
            if let Some(group) = target.group_mut(old) {
                group.name = new.clone();
            }
            let was_active = is_active_profile && config.active_group == old;
            if was_active {
                config.active_group = new;
            }
            Ok(((), was_active))
        })
    }

    pub fn delete_group(&self, profile: &str, name: &str) -> StoreResult<()> {
        self.mutate(|config| {
            let is_active_profile = config.active_profile == profile;
            let target = config
                .profile_mut(profile)
                .ok_or_else(|| StoreError::not_found(ItemKind::Profile, profile))?;
            let index = target
                .groups
                .iter()
                .position(|g| g.name == name)
                .ok_or_else(|| StoreError::not_found(ItemKind::Group, name))?;
            if target.groups.len() <= 1 {
                return Err(StoreError::LastItemProtected {
                    kind: ItemKind::Group,
                });
            }

            info!(profile = %profile, group = %name, "Deleting group");
            target.groups.remove(index);
            let first_group = target.first_group_name().unwrap_or_default().to_string();

            let was_active = is_active_profile && config.active_group == name;
            if was_active {
                info!(group = %first_group, "Active group deleted, selection moved");
                config.active_group = first_group;
            }
            Ok(((), was_active))
        })
    }

    // Buttons

    /// Append a button to a group, returning its index
    pub fn add_button(&self, profile: &str, group: &str, button: Button) -> StoreResult<usize> {
        let button = button.validated()?;
        self.mutate(|config| {
            let target = group_mut(config, profile, group)?;
            target.buttons.push(button);
            let index = target.buttons.len() - 1;
            info!(profile = %profile, group = %group, index, "Added button");
            Ok((index, is_active(config, profile, group)))
        })
    }

    pub fn update_button(
        &self,
        profile: &str,
        group: &str,
        index: usize,
        button: Button,
    ) -> StoreResult<()> {
        let button = button.validated()?;
        self.mutate(|config| {
            let target = group_mut(config, profile, group)?;
            let len = target.buttons.len();
            let slot = target
                .buttons
                .get_mut(index)
                .ok_or(StoreError::IndexOutOfRange { index, len })?;
            *slot = button;
            info!(profile = %profile, group = %group, index, "Updated button");
            Ok(((), is_active(config, profile, group)))
        })
    }

    /// Append a deep copy of the button at `index`, returning the copy's index
    pub fn duplicate_button(&self, profile: &str, group: &str, index: usize) -> StoreResult<usize> {
        self.mutate(|config| {
            let target = group_mut(config, profile, group)?;
            let len = target.buttons.len();
            let copy = target
                .buttons
                .get(index)
                .ok_or(StoreError::IndexOutOfRange { index, len })?
                .duplicate();
            target.buttons.push(copy);
            info!(profile = %profile, group = %group, index, "Duplicated button");
            Ok((len, is_active(config, profile, group)))
        })
    }

    /// Remove the button at `index`; a group may become empty
    pub fn delete_button(&self, profile: &str, group: &str, index: usize) -> StoreResult<Button> {
        self.mutate(|config| {
            let target = group_mut(config, profile, group)?;
            let len = target.buttons.len();
            if index >= len {
                return Err(StoreError::IndexOutOfRange { index, len });
            }
            let removed = target.buttons.remove(index);
            info!(profile = %profile, group = %group, index, "Deleted button");
            Ok((removed, is_active(config, profile, group)))
        })
    }

    // Selection

    /// Select a profile (and its first group), then persist the selection
    ///
    /// The selection only changes once the save succeeds.
    pub fn set_active_profile(&self, name: &str) -> StoreResult<Selection> {
        let mut state = self.lock();
        let first_group = state
            .config
            .profile(name)
            .ok_or_else(|| StoreError::not_found(ItemKind::Profile, name))?
            .first_group_name()
            .unwrap_or_default()
            .to_string();

        let changed = !state.is_active(name, &first_group);
        let mut next = state.config.clone();
        next.active_profile = name.to_string();
        next.active_group = first_group;
        self.save_locked(&next)?;

        state.config = next;
        if changed {
            state.revision += 1;
        }
        info!(profile = %name, group = %state.config.active_group, "Active profile set");
        Ok(Selection {
            active_profile: state.config.active_profile.clone(),
            active_group: state.config.active_group.clone(),
        })
    }

    /// Select a group within the active profile, then persist the selection
    ///
    /// The selection only changes once the save succeeds.
    pub fn set_active_group(&self, name: &str) -> StoreResult<Selection> {
        let mut state = self.lock();
        let profile = state.config.active_profile.clone();
        state
            .config
            .profile(&profile)
            .and_then(|p| p.group(name))
            .ok_or_else(|| StoreError::not_found(ItemKind::Group, name))?;

        let changed = state.config.active_group != name;
        let mut next = state.config.clone();
        next.active_group = name.to_string();
        self.save_locked(&next)?;

        state.config = next;
        if changed {
            state.revision += 1;
        }
        info!(profile = %profile, group = %name, "Active group set");
        Ok(Selection {
            active_profile: profile,
            active_group: state.config.active_group.clone(),
        })
    }
}

fn clean_name(name: &str, kind: ItemKind) -> StoreResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StoreError::EmptyName { kind });
    }
    Ok(name.to_string())
}

fn group_mut<'a>(config: &'a mut Config, profile: &str, group: &str) -> StoreResult<&'a mut Group> {
    config
        .profile_mut(profile)
        .ok_or_else(|| StoreError::not_found(ItemKind::Profile, profile))?
        .group_mut(group)
        .ok_or_else(|| StoreError::not_found(ItemKind::Group, group))
}

fn is_active(config: &Config, profile: &str, group: &str) -> bool {
    config.active_profile == profile && config.active_group == group
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chord(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    fn temp_store() -> (tempfile::TempDir, ConfigStore) {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::load(temp_dir.path().join("config.json"));
        (temp_dir, store)
    }

    fn assert_invariants(config: &Config) {
        let mut names: Vec<_> = config.profiles.iter().map(|p| &p.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), config.profiles.len(), "duplicate profile names");

        for profile in &config.profiles {
            assert!(!profile.groups.is_empty(), "profile without groups");
            let mut groups: Vec<_> = profile.groups.iter().map(|g| &g.name).collect();
            groups.sort();
            groups.dedup();
            assert_eq!(groups.len(), profile.groups.len(), "duplicate group names");
            for group in &profile.groups {
                assert!(group.buttons.iter().all(|b| !b.hotkey.is_empty()));
            }
        }

        let active = config.profile(&config.active_profile).expect("active profile");
        assert!(active.group(&config.active_group).is_some(), "active group");
    }

    #[test]
    fn test_load_missing_file_gives_default_store() {
        let (_dir, store) = temp_store();
        let config = store.snapshot();

        assert!(store.load_error().is_none());
        assert_eq!(config, Config::default());
        assert!(store.active_view().buttons.is_empty());
    }

    #[test]
    fn test_load_corrupt_file_falls_back_to_default() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.json");
        std::fs::write(&path, "{ definitely not json").unwrap();

        let store = ConfigStore::load(&path);
        assert_eq!(store.load_error().map(StoreError::kind), Some("corrupt_config"));
        assert_eq!(store.snapshot(), Config::default());
        // Original content preserved next to the config
        let quarantined = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .any(|e| e.file_name().to_string_lossy().contains(".corrupt-"));
        assert!(quarantined);
    }

    #[test]
    fn test_save_then_load_roundtrip() {
        let (dir, store) = temp_store();
        store.add_profile("Streaming").unwrap();
        store.add_group("Streaming", "Scenes").unwrap();
        let mut button = Button::new(
            "Scene Swap",
            vec![chord(&["ctrl", "shift", "1"]), chord(&["f13"])],
        );
        button.image = Some("assets/scene.png".to_string());
        store.add_button("Streaming", "Scenes", button).unwrap();
        store
            .add_button("Default", "Main", Button::new("Copy", vec![chord(&["ctrl", "c"])]))
            .unwrap();
        store.save().unwrap();

        let reloaded = ConfigStore::load(dir.path().join("config.json"));
        assert_eq!(reloaded.snapshot(), store.snapshot());
    }

    #[test]
    fn test_add_profile_rejects_duplicates_and_blank_names() {
        let (_dir, store) = temp_store();
        store.add_profile("Gaming").unwrap();

        assert_eq!(store.add_profile("Gaming").unwrap_err().kind(), "duplicate_name");
        assert_eq!(store.add_profile("  Gaming ").unwrap_err().kind(), "duplicate_name");
        assert_eq!(store.add_profile("   ").unwrap_err().kind(), "empty_name");
        // Case-sensitive
        store.add_profile("gaming").unwrap();

        let config = store.snapshot();
        assert_eq!(config.profiles.len(), 3);
        let gaming = config.profile("Gaming").unwrap();
        assert_eq!(gaming.groups.len(), 1);
        assert_eq!(gaming.groups[0].name, "Main");
        assert!(gaming.groups[0].buttons.is_empty());
    }

    #[test]
    fn test_rename_profile() {
        let (_dir, store) = temp_store();
        store.add_profile("Gaming").unwrap();

        // Same name is a no-op success
        let before = store.snapshot();
        store.rename_profile("Default", "Default").unwrap();
        assert_eq!(store.snapshot(), before);

        assert_eq!(
            store.rename_profile("Default", "Gaming").unwrap_err().kind(),
            "duplicate_name"
        );
        assert_eq!(
            store.rename_profile("Nope", "Other").unwrap_err().kind(),
            "not_found"
        );

        store.rename_profile("Default", "Work").unwrap();
        let selection = store.selection();
        assert_eq!(selection.active_profile, "Work");
        assert_invariants(&store.snapshot());
    }

    #[test]
    fn test_delete_only_profile_is_protected() {
        let (_dir, store) = temp_store();
        let before = store.snapshot();

        let err = store.delete_profile("Default").unwrap_err();
        assert!(matches!(
            err,
            StoreError::LastItemProtected {
                kind: ItemKind::Profile
            }
        ));
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_delete_active_profile_repairs_selection() {
        let (_dir, store) = temp_store();
        store.add_profile("Gaming").unwrap();
        store.add_group("Gaming", "FPS").unwrap();
        store.set_active_profile("Gaming").unwrap();
        store.set_active_group("FPS").unwrap();

        store.delete_profile("Gaming").unwrap();
        let selection = store.selection();
        assert_eq!(selection.active_profile, "Default");
        assert_eq!(selection.active_group, "Main");
        assert_invariants(&store.snapshot());
    }

    #[test]
    fn test_add_group_validation() {
        let (_dir, store) = temp_store();
        assert_eq!(
            store.add_group("Nope", "Scenes").unwrap_err().kind(),
            "not_found"
        );
        assert_eq!(
            store.add_group("Default", "Main").unwrap_err().kind(),
            "duplicate_name"
        );
        store.add_group("Default", "Scenes").unwrap();
        assert_eq!(store.snapshot().profiles[0].groups.len(), 2);
    }

    #[test]
    fn test_rename_active_group_updates_selection() {
        let (_dir, store) = temp_store();
        store.add_group("Default", "Audio").unwrap();
        let revision = store.active_view().revision;

        assert_eq!(
            store.rename_group("Default", "Main", "Audio").unwrap_err().kind(),
            "duplicate_name"
        );
        store.rename_group("Default", "Main", "Main").unwrap();
        assert_eq!(store.active_view().revision, revision);

        store.rename_group("Default", "Main", "Video").unwrap();
        assert_eq!(store.selection().active_group, "Video");
        assert!(store.active_view().revision > revision);
        assert_invariants(&store.snapshot());
    }

    #[test]
    fn test_delete_active_group_moves_to_remaining_group() {
        let (_dir, store) = temp_store();
        store.add_group("Default", "Audio").unwrap();
        store
            .add_button("Default", "Audio", Button::new("Mute", vec![chord(&["f10"])]))
            .unwrap();

        store.delete_group("Default", "Main").unwrap();
        assert_eq!(store.selection().active_group, "Audio");
        let buttons = store.active_view().buttons;
        assert_eq!(buttons.len(), 1);
        assert_eq!(buttons[0].text, "Mute");

        let err = store.delete_group("Default", "Audio").unwrap_err();
        assert_eq!(err.kind(), "last_item_protected");
        assert_invariants(&store.snapshot());
    }

    #[test]
    fn test_add_button_without_keys_is_rejected() {
        let (_dir, store) = temp_store();
        let mut button = Button::new("Empty", vec![]);
        button.sequence.clear();

        let err = store.add_button("Default", "Main", button).unwrap_err();
        assert!(matches!(err, StoreError::NoKeysDefined));
        assert!(store.active_view().buttons.is_empty());

        let err = store
            .add_button("Default", "Main", Button::new(" ", vec![chord(&["a"])]))
            .unwrap_err();
        assert!(matches!(err, StoreError::EmptyText));
        assert!(store.active_view().buttons.is_empty());
    }

    #[test]
    fn test_update_button() {
        let (_dir, store) = temp_store();
        store
            .add_button("Default", "Main", Button::new("Old", vec![chord(&["a"])]))
            .unwrap();

        store
            .update_button("Default", "Main", 0, Button::new("New", vec![chord(&["b"])]))
            .unwrap();
        assert_eq!(store.active_view().buttons[0].text, "New");

        let err = store
            .update_button("Default", "Main", 3, Button::new("X", vec![chord(&["b"])]))
            .unwrap_err();
        assert!(matches!(err, StoreError::IndexOutOfRange { index: 3, len: 1 }));

        let err = store
            .update_button("Default", "Main", 0, Button::new("", vec![chord(&["b"])]))
            .unwrap_err();
        assert!(matches!(err, StoreError::EmptyText));
        assert_eq!(store.active_view().buttons[0].text, "New");
    }

    #[test]
    fn test_duplicate_button_appends_copy() {
        let (_dir, store) = temp_store();
        let mut original = Button::new("Copy Me", vec![chord(&["ctrl", "c"]), chord(&["ctrl", "v"])]);
        original.background_color = "#112233".to_string();
        store.add_button("Default", "Main", original.clone()).unwrap();
        store
            .add_button("Default", "Main", Button::new("Other", vec![chord(&["x"])]))
            .unwrap();

        let index = store.duplicate_button("Default", "Main", 0).unwrap();
        assert_eq!(index, 2);

        let buttons = store.active_view().buttons;
        assert_eq!(buttons.len(), 3);
        assert_eq!(buttons[2].text, "Copy Me (Copy)");
        assert_eq!(buttons[2].hotkey, original.hotkey);
        assert_eq!(buttons[2].sequence, original.sequence);
        assert_eq!(buttons[2].background_color, "#112233");
        assert_eq!(buttons[2].text_color, original.text_color);
    }

    #[test]
    fn test_delete_button_may_empty_group() {
        let (_dir, store) = temp_store();
        store
            .add_button("Default", "Main", Button::new("Only", vec![chord(&["a"])]))
            .unwrap();

        assert!(matches!(
            store.delete_button("Default", "Main", 1),
            Err(StoreError::IndexOutOfRange { index: 1, len: 1 })
        ));
        let removed = store.delete_button("Default", "Main", 0).unwrap();
        assert_eq!(removed.text, "Only");
        assert!(store.active_view().buttons.is_empty());
        assert_invariants(&store.snapshot());
    }

    #[test]
    fn test_set_active_profile_persists_immediately() {
        let (dir, store) = temp_store();
        store.add_profile("Gaming").unwrap();
        store.add_group("Gaming", "FPS").unwrap();

        let selection = store.set_active_profile("Gaming").unwrap();
        assert_eq!(selection.active_profile, "Gaming");
        assert_eq!(selection.active_group, "Main");

        let on_disk = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(on_disk.active_profile, "Gaming");
        assert_eq!(on_disk.profiles.len(), 2);

        assert_eq!(
            store.set_active_profile("Missing").unwrap_err().kind(),
            "not_found"
        );
        assert_eq!(store.selection().active_profile, "Gaming");
    }

    #[test]
    fn test_set_active_group_scoped_to_active_profile() {
        let (_dir, store) = temp_store();
        store.add_profile("Gaming").unwrap();
        store.add_group("Gaming", "FPS").unwrap();

        assert_eq!(store.set_active_group("FPS").unwrap_err().kind(), "not_found");

        store.set_active_profile("Gaming").unwrap();
        let selection = store.set_active_group("FPS").unwrap();
        assert_eq!(selection.active_group, "FPS");
    }

    #[test]
    fn test_failed_selection_save_keeps_previous_selection() {
        let (dir, store) = temp_store();
        store.add_profile("Gaming").unwrap();
        store.add_group("Default", "Other").unwrap();
        let before = store.active_view();

        // A directory in place of the config file makes every save fail
        std::fs::create_dir(dir.path().join("config.json")).unwrap();

        assert_eq!(store.set_active_profile("Gaming").unwrap_err().kind(), "io");
        assert_eq!(store.set_active_group("Other").unwrap_err().kind(), "io");

        let selection = store.selection();
        assert_eq!(selection.active_profile, "Default");
        assert_eq!(selection.active_group, "Main");
        assert_eq!(store.active_view().revision, before.revision);
    }

    #[test]
    fn test_revision_tracks_active_group_changes() {
        let (_dir, store) = temp_store();
        store.add_group("Default", "Other").unwrap();
        let start = store.active_view().revision;

        // Mutating a non-active group leaves the revision alone
        store
            .add_button("Default", "Other", Button::new("A", vec![chord(&["a"])]))
            .unwrap();
        assert_eq!(store.active_view().revision, start);

        store
            .add_button("Default", "Main", Button::new("B", vec![chord(&["b"])]))
            .unwrap();
        assert_eq!(store.active_view().revision, start + 1);

        store.set_active_group("Other").unwrap();
        let view = store.active_view();
        assert_eq!(view.revision, start + 2);
        assert_eq!(view.buttons[0].text, "A");

        let (revision, config) = store.versioned_snapshot();
        assert_eq!(revision, view.revision);
        assert_eq!(config.active_group, "Other");
        assert_eq!(config.active_buttons(), view.buttons.as_slice());
    }

    #[test]
    fn test_save_preferences_clamps_and_persists() {
        let (dir, store) = temp_store();
        let saved = store
            .save_preferences(Preferences {
                theme: crate::config::Theme::Light,
                buttons_per_row: 12,
                button_height: 80,
                button_width: 10,
            })
            .unwrap();

        assert_eq!(saved.buttons_per_row, 6);
        assert_eq!(saved.button_width, 50);

        let on_disk = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(on_disk.default_preferences, saved);
        assert_eq!(store.preferences(), saved);
    }

    #[test]
    fn test_reload_picks_up_external_changes() {
        let (dir, store) = temp_store();
        store.save().unwrap();

        let mut external = store.snapshot();
        external.profiles.push(Profile::new("External"));
        external.save_to(&dir.path().join("config.json")).unwrap();

        store.reload().unwrap();
        assert!(store.snapshot().profile("External").is_some());
    }

    #[test]
    fn test_concurrent_mutations_keep_invariants() {
        let (_dir, store) = temp_store();
        let store = std::sync::Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for j in 0..10 {
                        let _ = store.add_profile(&format!("P{}", (i + j) % 5));
                        let _ = store.add_button(
                            "Default",
                            "Main",
                            Button::new(format!("B{i}-{j}"), vec![chord(&["a"])]),
                        );
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let config = store.snapshot();
        assert_eq!(config.profiles.len(), 6);
        assert_eq!(store.active_view().buttons.len(), 80);
        assert_invariants(&config);
    }
}
