//! Workspace placeholder crate.
//!
//! This crate exposes feature flags that map to the individual workspace
//! crates (`core-service`, `core-metadata`, `core-script`). A host bot can
//! depend on `vexo-core-workspace` and enable the documented features without
//! wiring each crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_service::{bootstrap_desktop, CoreService, ScriptInvocation};

#[cfg(feature = "metadata")]
pub use core_metadata::{MetadataResolver, MetadataResult, TrackQuery};

#[cfg(feature = "script")]
pub use core_script::{ScriptGenerator, ScriptResult};
