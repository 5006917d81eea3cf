//! Cache-fronted document viewing for offpage.
//!
//! This crate provides:
//! - The rendering-surface capability seam and its event type
//! - The intercepted-task registry
//! - The custom-scheme request interceptor
//! - The document load orchestrator
//! - The cache service composition root

pub mod interceptor;
pub mod orchestrator;
pub mod service;
pub mod surface;
pub mod task;

#[cfg(test)]
pub(crate) mod testing;

pub use interceptor::SchemeInterceptor;
pub use orchestrator::DocumentLoader;
pub use service::CacheService;
pub use surface::{RenderSurface, SurfaceEvent};
pub use task::{InterceptedTask, LoadFailure, ResponseMeta, TaskId, TaskRegistry};
