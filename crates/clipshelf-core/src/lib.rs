//! # Clipshelf Core Library
//!
//! `clipshelf-core` provides the engine behind Clipshelf, a clipboard history
//! manager with pinning and paste-back.
//!
//! ## Features
//!
//! - **Bounded history**: newest first, deduplicated, oldest unpinned entries evicted
//! - **Pinning**: pinned entries survive eviction and restarts
//! - **Images**: large images are scaled down before they are stored
//! - **Paste-back**: picking an entry pastes it into the previously focused app,
//!   without the write being recorded as a new copy
//!
//! ## Modules
//!
//! - [`clipboard`] - System clipboard access and the change watcher
//! - [`config`] - Configuration management
//! - [`focus`] - Focus restoration and synthetic paste
//! - [`fingerprint`] - Content fingerprints for duplicate detection
//! - [`history`] - The history store
//! - [`normalize`] - Image downscaling
//! - [`paste`] - Selection and paste-back
//! - [`storage`] - Pinned entry persistence
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use clipshelf_core::{clipboard, config::Config, history::HistoryStore};
//!
//! let config = Config::load()?;
//! let store = Arc::new(
//!     HistoryStore::from_config(&config).with_storage(config.storage.pinned_storage()),
//! );
//! store.restore();
//!
//! let (_changes, watcher) = clipboard::ClipboardWatcher::with_config(config.watcher)
//!     .start(Arc::clone(&store), clipboard::create_clipboard()?);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]

pub mod clipboard;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod focus;
pub mod history;
pub mod normalize;
pub mod paste;
pub mod storage;

pub use error::{Error, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
