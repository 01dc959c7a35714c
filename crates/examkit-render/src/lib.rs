//! examkit-render — Assignment sheet rendering.
//!
//! Produces the documents the engine hands to the notifier: a
//! self-contained HTML sheet per student and the plain-text email body
//! around it.

pub mod html;
pub mod text;

pub use html::HtmlRenderer;
pub use text::PlainTextComposer;
