//! Domain models shared by the auth, session and permission layers.

pub mod auth;
pub mod permission;
