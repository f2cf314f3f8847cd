//! Keystroke injection backends

pub mod backend;
pub mod keymap;
pub mod log_backend;
pub mod uinput_backend;

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

pub use backend::{InjectorBackendType, KeyIntent, KeyInjector};

/// Construct the selected injection backend
pub fn create_injector(backend: InjectorBackendType) -> Result<Arc<dyn KeyInjector>> {
    let injector: Arc<dyn KeyInjector> = match backend {
        InjectorBackendType::Uinput => Arc::new(uinput_backend::UinputInjector::new()?),
        InjectorBackendType::Log => Arc::new(log_backend::LogInjector),
    };
    info!(backend = injector.name(), "Key injection backend ready");
    Ok(injector)
}
