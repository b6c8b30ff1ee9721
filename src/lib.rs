//! hookwire - A GitHub webhook receiver that dispatches typed events to
//! registered hooks.
//!
//! A [`bot::Bot`] verifies each delivery's HMAC-SHA256 signature, decodes it
//! into a [`webhooks::Event`], and runs the hooks registered for its kind in
//! order, stopping at the first failure.

pub mod bot;
pub mod config;
pub mod dispatch;
pub mod server;
pub mod types;
pub mod webhooks;

#[cfg(test)]
mod test_utils;
