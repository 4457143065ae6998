#![deny(unused)]
//! Capability backends for stacklens.
//!
//! Concrete implementations of the response cache and the per-domain
//! rate limiter: Redis-backed for shared multi-instance deployments,
//! in-memory for local development and tests.

pub mod memory;
pub mod redis;

pub use memory::{InMemoryRateLimiter, InMemoryResponseCache};
pub use redis::{RedisRateLimiter, RedisResponseCache};
