//! # lyceum-client
//!
//! Messaging and notification client for the classroom server.
//!
//! A [`MessagingModule`] resolves the logged-in user once, keeps an
//! in-memory inbox in sync with the server, sends messages and drives the
//! read/unread state of notifications. Everything it wants shown is
//! published as a [`UiEvent`].

pub mod cli;
pub mod composer;
pub mod config;
pub mod directory;
pub mod error;
pub mod events;
pub mod identity;
pub mod notifications;
pub mod session;
pub mod sync;
pub mod view;

#[cfg(test)]
mod testing;

pub use config::ClientConfig;
pub use error::{ClientError, IdentityStep};
pub use events::{Control, ToastKind, UiEvent, UiEvents};
pub use session::MessagingModule;
pub use view::InboxView;
