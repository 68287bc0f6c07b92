//! Read-only storage core for the claim index hub.
//!
//! The claim registry is persisted by an external writer in a RocksDB store
//! where every logical row type owns a one-byte prefix and a column family
//! of the same name. This crate provides everything that sits between those
//! raw bytes and the query layer:
//!
//! - byte-exact typed codecs for every registered row ([`rows`]),
//! - the prefix/column-family registry ([`Prefix`]),
//! - a secondary-mode adapter over the store ([`SecondaryDb`]),
//! - bounded lazy iteration ([`iterator`]) and typed index views,
//! - the follower loop that tracks the writer and notifies subscribers of
//!   new heights and touched claims ([`Follower`]).
//!
//! Nothing in this crate writes to the store; the secondary directory is a
//! disposable cache.

pub mod codec;
mod db;
mod error;
mod follower;
mod iterator;
mod prefix;
pub mod rows;
mod state;
mod views;

pub use db::SecondaryDb;
pub use error::{Error, Result};
pub use follower::{ChangeEvent, Follower, FollowerConfig, FollowerHandle};
pub use iterator::{IterOptions, RawRow, RowIter, TypedRowIter};
pub use prefix::Prefix;
pub use state::StateCell;
