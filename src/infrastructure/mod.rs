//! Adapters for every external collaborator: in-memory doubles, the hosted
//! platform's REST dialect, the payment gateway client, the support
//! completion client, and the file-backed session vault.

pub mod completion;
pub mod gateway;
pub mod in_memory;
pub mod rest;
pub mod session_file;
