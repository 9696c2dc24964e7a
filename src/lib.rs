//! Long-polls the dvmn.org review API and reports graded homework to a
//! Telegram chat. The binary in `main.rs` wires the pieces together; this
//! library holds the API client, the message templates, the delivery
//! channels, and the polling loop itself.

pub mod api;
pub mod config;
pub mod logging;
pub mod notify;
pub mod poll;
pub mod telegram;
