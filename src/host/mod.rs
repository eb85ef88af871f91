//! Host capability API
//!
//! The embedding process injects an implementation of [`HostApi`] some time
//! after the UI starts. Everything in this crate reaches the host through a
//! [`HostGate`], which resolves once that injection has happened.

mod api;
mod gate;

pub use api::{Devices, HostApi};
pub use gate::{HostGate, HostProvider};
