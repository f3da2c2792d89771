//! Cross-module scenario tests against the in-memory ledger and a canned
//! JSON-RPC server

mod transfer_properties;
