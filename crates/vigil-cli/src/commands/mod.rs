//! CLI subcommand implementations.

pub(crate) mod access;
pub(crate) mod doc;
pub(crate) mod keys;
pub(crate) mod ledger;
pub(crate) mod threats;
