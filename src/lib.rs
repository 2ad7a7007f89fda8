//! This crate provides the data side of a personal student-portal client.
//!
//! It fetches notices, news and schedules from the portal web API, signing every request with the
//! user's OAuth credentials (see [`signer`]), and keeps a local copy of each document in a [`cache`](cache::Cache)
//! so that a front-end can display data on startup, or without network access at all.
//!
//! A [`CachedResourceFetcher`](fetcher::CachedResourceFetcher) decides when a cached document must be refreshed. \
//! The raw documents are then decoded by the parsers of the [`formats`] module (JSON notices, RSS news, iCal schedules),
//! and notices are grouped by enrolled subject by the [`aggregator`]. \
//! A [`Session`] ties all of these together and is what a front-end usually needs.

pub mod error;
pub use error::PortalError;
pub mod settings;
pub mod credentials;
pub use credentials::CredentialStore;
pub mod signer;

pub mod client;
pub mod mock_transport;
pub mod cache;
pub mod resource;
pub use resource::Resource;
pub mod fetcher;

pub mod formats;
mod notice;
pub use notice::{Attachment, Notice, PubDate};
mod event;
pub use event::ScheduleEvent;
mod subject;
pub use subject::{ColorScheme, Profile, Subject};
pub mod aggregator;

pub mod session;
pub use session::Session;

pub mod utils;
