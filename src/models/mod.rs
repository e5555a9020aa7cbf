//! Wire models for the upload function.
//!
//! The inbound event mirrors what an HTTP API gateway hands to a function
//! invocation; the outbound response is the gateway-shaped reply built from it.
//! Both serialize as camelCase JSON via `serde`.

pub mod event;
pub mod response;
