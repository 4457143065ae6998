#![deny(unused)]
//! HTTP edge gateway for stacklens.
//!
//! This crate provides the request pipeline in front of the backend
//! analysis service: validation, URL canonicalization for cache
//! addressing, cache-first routing, per-domain admission control,
//! origin forwarding with a configurable failure policy, and
//! static-asset fallback for non-API routes.

pub mod assets;
pub mod background;
pub mod normalize;
pub mod origin;
pub mod server;
pub mod validate;

pub use assets::DirAssets;
pub use background::BackgroundTasks;
pub use normalize::normalize_url;
pub use origin::HttpOrigin;
pub use server::{GatewayConfig, GatewayServer};
