//! Non-visual core of a personal movie/performer catalog.
//!
//! Movies and performers live in a central [`core::store::CatalogStore`]
//! and reference each other by stable id; link and unlink keep both sides
//! symmetric, and removing a movie cascades to performers left without any
//! movie. The catalog persists as a directory of per-entity files swapped
//! into place atomically, and remote metadata can be merged into a movie
//! without corrupting it on partial or malformed responses.
//!
//! # Examples
//!
//! In-memory usage:
//! ```
//! use cinelog::{
//!     core::store::CatalogStore,
//!     movie::MovieDraft,
//!     performer::PerformerDraft,
//! };
//!
//! let mut store = CatalogStore::new();
//! let movie = store.add_movie(MovieDraft {
//!     title: "Heat".to_string(),
//!     rating: 50,
//!     ..MovieDraft::default()
//! });
//! let performer = store.add_performer(PerformerDraft {
//!     first_name: "Al".to_string(),
//!     last_name: "Pacino".to_string(),
//!     rating: 70,
//!     ..PerformerDraft::default()
//! });
//! store.link(movie, performer).expect("link");
//! assert_eq!(store.overall_rating(movie).expect("rating"), 60);
//! assert!(store.is_dirty());
//! ```
//!
//! Runtime usage with a directory sink:
//! ```no_run
//! use cinelog::{
//!     core::store::CatalogStore,
//!     movie::MovieDraft,
//!     persist::dir::CatalogDir,
//!     runtime::handle::{RuntimeConfig, spawn_catalog},
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let sink = CatalogDir::open("catalog");
//! let handle = spawn_catalog(
//!     CatalogStore::new(),
//!     Some(Box::new(sink)),
//!     None,
//!     RuntimeConfig::default(),
//! );
//! let _id = handle
//!     .add_movie(MovieDraft {
//!         title: "Heat".to_string(),
//!         ..MovieDraft::default()
//!     })
//!     .await
//!     .expect("add");
//! handle.save().await.expect("save");
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![warn(missing_docs)]

/// Core in-memory store and relationship rules.
pub mod core;
/// Movie domain records and patches.
pub mod movie;
/// Performer domain records and patches.
pub mod performer;
/// Persistence abstraction and directory engine.
pub mod persist;
/// Single-writer runtime handle and events.
pub mod runtime;
/// External metadata fetch and merge.
pub mod sync;
/// Shared primitive types and helpers.
pub mod types;
