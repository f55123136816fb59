//! Inbound edges: the payment return-URL contract and the CSV seed/export
//! surfaces used by the CLI.

pub mod csv;
pub mod redirect;
