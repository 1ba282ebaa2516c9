//! Concurrent collections.

pub mod external_bst;

pub use external_bst::ExternalBst;
