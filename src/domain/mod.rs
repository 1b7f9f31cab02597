//! Domain layer containing the command registry builder.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (action, function shapes, snapshot, errors)
//! - `naming` - Identifier derivation from names and naming conventions
//! - `interceptor` - Tag-keyed hook maps and hook resolution
//! - `command` - Command descriptors and the factory that builds them
//! - `area` - Base and Area configuration
//! - `chain` - Plain and fetch chain builders
//! - `registry` - Per-Area registry, root dispatcher and slice combiner
//! - `workflow` - Workflow binding records

pub mod area;
pub mod chain;
pub mod command;
pub mod foundation;
pub mod interceptor;
pub mod naming;
pub mod registry;
pub mod workflow;
