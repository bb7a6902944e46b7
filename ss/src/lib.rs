//! SessionStore - durable key/record persistence for conversation state
//!
//! Holds one record per session key and rewrites the entire snapshot file on
//! every mutation, so the durable state always equals the last successful
//! `put`. Reopening the store reloads the snapshot verbatim.
//!
//! # Layout
//!
//! ```text
//! sessions.json        # the snapshot: one JSON object, key -> record
//! sessions.json.lock   # held exclusively while a store is open
//! sessions.json.tmp    # staging file for the atomic rewrite
//! ```
//!
//! # Example
//!
//! ```ignore
//! use sessionstore::SessionStore;
//!
//! let mut store: SessionStore<MyRecord> = SessionStore::open("sessions.json")?;
//! store.put("chat-42", record)?;          // durable once this returns
//! let current = store.get("chat-42");
//! ```

pub mod cli;
pub mod config;
mod store;

pub use store::{SessionKey, SessionStore};
