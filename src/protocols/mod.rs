//! Application-layer evidence pulled from packet payloads.

pub mod dns;
pub mod http;
