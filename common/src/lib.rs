//! Pure traversal helpers over decoded carrier payloads.
//!
//! The relay receives untyped JSON documents from the carrier and never
//! assumes a full schema. This crate keeps the parts that only look at
//! [`serde_json::Value`] trees, so they can be tested without any network
//! or server plumbing.

pub mod tree;

pub use tree::{
    LOCALISED_STRING_ID, display_pointer, extract_localised_ids, extract_localised_ids_from,
    str_at,
};
