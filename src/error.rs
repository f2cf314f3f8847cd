//! Error taxonomy shared by the configuration store and the trigger engine
//!
//! Structural validation errors are reported to the caller and never mutate
//! the store. `CorruptConfig` is recovered by substituting the default store,
//! `InjectionFailure` is reported per request. Nothing here is process-fatal.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// What kind of item a `NotFound`/`DuplicateName` error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Profile,
    Group,
    Button,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ItemKind::Profile => "profile",
            ItemKind::Group => "group",
            ItemKind::Button => "button",
        })
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{kind} '{name}' already exists")]
    DuplicateName { kind: ItemKind, name: String },

    #[error("{kind} name cannot be empty")]
    EmptyName { kind: ItemKind },

    #[error("{kind} '{name}' not found")]
    NotFound { kind: ItemKind, name: String },

    #[error("cannot delete the last {kind}")]
    LastItemProtected { kind: ItemKind },

    #[error("button text cannot be empty")]
    EmptyText,

    #[error("button must have at least one key combination")]
    NoKeysDefined,

    #[error("button index {index} out of range (group has {len} buttons)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("config at {path:?} is corrupt: {reason}")]
    CorruptConfig { path: PathBuf, reason: String },

    #[error("key injection failed: {0}")]
    InjectionFailure(String),

    #[error("failed to persist config to {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    /// Stable identifier reported over the control surface
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::DuplicateName { .. } => "duplicate_name",
            StoreError::EmptyName { .. } => "empty_name",
            StoreError::NotFound { .. } => "not_found",
            StoreError::LastItemProtected { .. } => "last_item_protected",
            StoreError::EmptyText => "empty_text",
            StoreError::NoKeysDefined => "no_keys_defined",
            StoreError::IndexOutOfRange { .. } => "index_out_of_range",
            StoreError::CorruptConfig { .. } => "corrupt_config",
            StoreError::InjectionFailure(_) => "injection_failure",
            StoreError::Io { .. } => "io",
        }
    }

    pub(crate) fn not_found(kind: ItemKind, name: impl Into<String>) -> Self {
        StoreError::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub(crate) fn duplicate(kind: ItemKind, name: impl Into<String>) -> Self {
        StoreError::DuplicateName {
            kind,
            name: name.into(),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = StoreError::duplicate(ItemKind::Profile, "Gaming");
        assert_eq!(err.to_string(), "profile 'Gaming' already exists");

        let err = StoreError::LastItemProtected {
            kind: ItemKind::Group,
        };
        assert_eq!(err.to_string(), "cannot delete the last group");

        let err = StoreError::IndexOutOfRange { index: 4, len: 2 };
        assert_eq!(
            err.to_string(),
            "button index 4 out of range (group has 2 buttons)"
        );
    }

    #[test]
    fn test_error_kinds_are_stable() {
        assert_eq!(StoreError::EmptyText.kind(), "empty_text");
        assert_eq!(StoreError::NoKeysDefined.kind(), "no_keys_defined");
        assert_eq!(
            StoreError::not_found(ItemKind::Button, "3").kind(),
            "not_found"
        );
        assert_eq!(
            StoreError::InjectionFailure("x".into()).kind(),
            "injection_failure"
        );
    }
}
