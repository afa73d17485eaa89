//! notewell - markdown workspace browser and preview renderer.
//!
//! Module layout:
//! - models: workspace tree arena and render blocks (pure state)
//! - kernel::services: filesystem/diagram/settings ports and their adapters
//! - kernel::preview: path resolution, asset loading, block pipeline
//! - kernel: workspace driver, document session, top-level session

pub mod kernel;
pub mod models;

#[cfg(test)]
#[path = "../tests/unit/support.rs"]
pub(crate) mod test_support;
