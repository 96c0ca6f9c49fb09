//! lambdapack-lib: packaging and publishing of Lambda bundles
//!
//! The workflow runs in four stages:
//! - `install`: materialize declared dependencies with an external installer
//! - `archive`: zip dependencies, sources and scripts into one bundle
//! - `publish`: upload the bundle under a versioned and a `latest` key
//! - `notify`: optionally report the versioned key to TeamCity
//!
//! `pipeline` chains them; `project` loads the descriptor they all read.

pub mod archive;
pub mod consts;
pub mod install;
pub mod notify;
pub mod pipeline;
pub mod project;
pub mod publish;
pub mod util;
