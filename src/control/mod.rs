//! Control surface consumed by view layers
//!
//! `protocol` defines the messages, `surface` executes them against the store
//! and trigger engine, and `server` carries them over a local socket.

pub mod protocol;
pub mod server;
pub mod surface;

pub use protocol::{Request, Response};
pub use server::{ControlServer, default_socket_path};
pub use surface::ControlSurface;
