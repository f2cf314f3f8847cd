//! uinput key injection backend
//!
//! Creates a virtual keyboard through /dev/uinput and replays key intents on it.
//! Works under X11 and Wayland alike because events enter the kernel input stack.
//! Requires write access to /dev/uinput (typically the 'input' group or a udev rule).

use anyhow::{Context, Result, anyhow};
use evdev::uinput::VirtualDevice;
use evdev::{AttributeSet, EventType, InputEvent, KeyCode};
use std::sync::Mutex;
use tracing::{debug, info};

use crate::constants::input;
use crate::input::backend::{KeyIntent, KeyInjector};
use crate::input::keymap::symbol_to_key_code;

/// Highest keyboard key code registered on the virtual device (KEY_MICMUTE)
const MAX_KEYBOARD_CODE: u16 = 248;

pub struct UinputInjector {
    device: Mutex<VirtualDevice>,
}

impl UinputInjector {
    pub fn new() -> Result<Self> {
        let mut keys = AttributeSet::<KeyCode>::new();
        for code in 1..=MAX_KEYBOARD_CODE {
            keys.insert(KeyCode(code));
        }

        let device = VirtualDevice::builder()
            .context("Failed to open /dev/uinput (is the user allowed to write to it?)")?
            .name(input::VIRTUAL_DEVICE_NAME)
            .with_keys(&keys)
            .context("Failed to register keys on virtual keyboard")?
            .build()
            .context("Failed to create virtual keyboard")?;

        info!(name = input::VIRTUAL_DEVICE_NAME, "Created virtual keyboard");
        Ok(Self {
            device: Mutex::new(device),
        })
    }
}

impl KeyInjector for UinputInjector {
    fn send(&self, intent: &KeyIntent) -> Result<()> {
        let code = symbol_to_key_code(intent.key())
            .ok_or_else(|| anyhow!("Unknown key symbol: {}", intent.key()))?;
        let value = if intent.is_press() {
            input::KEY_PRESS
        } else {
            input::KEY_RELEASE
        };

        debug!(%intent, code = code.code(), "Emitting key event");
        let mut device = self
            .device
            .lock()
            .map_err(|_| anyhow!("Virtual keyboard lock poisoned"))?;
        // emit() appends the SYN_REPORT
        device
            .emit(&[InputEvent::new(EventType::KEY.0, code.code(), value)])
            .with_context(|| format!("Failed to emit {}", intent))
    }

    fn name(&self) -> &'static str {
        "uinput"
    }
}
