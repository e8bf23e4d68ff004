//! nativestart packer
//!
//! Produces everything a native launcher stub needs at run time:
//!
//! - [`descriptor::DescriptorBuilder`] hashes and compresses the JVM,
//!   libraries and resources and writes the (optionally signed) descriptor
//!   JSON next to the compressed payloads.
//! - [`executable::ExecutableBuilder`] turns a precompiled generic stub into
//!   an application specific executable by patching its placeholders and,
//!   for Windows, appending a `.rsrc` section with icon, version info and
//!   application manifest.
//!
//! The two pipelines only share the signing key pair and the base URL.

pub mod archive;
pub mod descriptor;
pub mod error;
pub mod executable;
pub mod hashing;
pub mod keys;
pub mod stub;

pub use descriptor::DescriptorBuilder;
pub use error::{PackError, Result};
pub use executable::ExecutableBuilder;
pub use stub::{StubDirectory, StubSource};

pub use nativestart_schema as schema;
