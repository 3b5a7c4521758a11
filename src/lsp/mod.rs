//! LSP Protocol Implementation
//!
//! Commands arrive through `workspace/executeCommand`; document lifecycle
//! notifications drive the scratch document sessions.

pub mod backend;
pub mod document;
pub mod handlers;
pub mod host;
pub mod server;

pub use backend::Backend;
pub use host::LspHost;
