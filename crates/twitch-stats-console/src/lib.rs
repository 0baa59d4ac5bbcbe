//! Interactive line-editing console for a chat-bot terminal.
//!
//! A raw-mode, single-threaded input processor supporting cursor
//! movement, history recall with prefix filtering, tab-completion
//! cycling over an external name lookup, and horizontal viewport
//! scrolling for lines wider than the terminal.
//!
//! The console depends on exactly two collaborator surfaces: a
//! [`complete::NameLookup`] for completion candidates and a
//! [`render::Renderer`] for drawing. Everything else (chat protocol,
//! persistence, HTTP) lives at the call site.

pub mod buffer;
pub mod complete;
pub mod editor;
pub mod key;
pub mod render;
pub mod session;
pub mod term;

pub use buffer::CycleBuffer;
pub use complete::NameLookup;
pub use editor::EditorState;
pub use key::Key;
pub use render::{InteractiveRenderer, PromptRenderer, Renderer};
pub use session::{ConsoleError, ConsoleSession};
pub use term::RawModeGuard;
