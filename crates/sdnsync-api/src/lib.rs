// sdnsync-api: typed async client for the controller's Intent API.

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

mod devices;
mod hardware;
mod interfaces;

pub use client::{IntentClient, PAGE_SIZE};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
