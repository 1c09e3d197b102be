//! Rebuild a job description scattered across `--spec-*` flags and launch it.
//!
//! A producer that hits the argv length limit base64-encodes a JSON job
//! document, splits the encoded text into indexed chunks, and passes each
//! chunk in its own flag. This crate reassembles the chunks in declared
//! order, decodes the payload, and launches the described executable with a
//! merged environment and an optional, scoped working directory.
//!
//! The pipeline is strictly sequential and blocking:
//! [`Spec::from_args`] → [`Job::from_spec`] → [`launch`].

mod codec;
mod env;
mod error;
mod job;
mod launch;
mod spec;

pub use codec::{Base64, CodecError};
pub use env::Environment;
pub use error::LaunchError;
pub use job::Job;
pub use launch::{ExitCode, launch};
pub use spec::Spec;
