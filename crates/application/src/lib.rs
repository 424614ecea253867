//! tldns Application Layer
//!
//! Ports for the collaborators a session needs (DNS codec, upstream client)
//! and the use case that turns one framed payload into the bytes sent back.
pub mod ports;
pub mod use_cases;
