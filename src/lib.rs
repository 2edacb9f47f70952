//! An in-process feature toggle evaluation engine.
//!
//! # Overview
//!
//! The engine revolves around a [`Client`] that decides, for a request [`Context`], whether a
//! named feature is enabled and which [`Variant`] of it applies. Features are evaluated against
//! an immutable [`Snapshot`] of feature definitions held in a [`FeatureStore`]; fetching those
//! definitions is left to the host application, which publishes new snapshots with
//! [`FeatureStore::set_snapshot`].
//!
//! Each feature lists strategies in precedence order. A strategy succeeds when all of its
//! constraints (inline and from referenced segments) hold and its predicate accepts the context;
//! the first successful strategy enables the feature. Rollouts and variant selection are sticky:
//! the same identity lands in the same bucket on every evaluation, see [`sharder`].
//!
//! Custom strategies implement [`strategy::Strategy`] and are registered through
//! [`ClientConfig::strategy`].
//!
//! # Error Handling
//!
//! Evaluation never fails and never panics on bad feature data. Unknown strategies, dangling
//! dependencies and segments, and malformed definitions degrade to the feature being disabled
//! and are reported to the [`EventListener`] as [`Event`]s. Warnings are emitted once per
//! offending reference for the lifetime of the client.
//!
//! Setup errors (e.g., a strategy registered without a name) are represented by the [`Error`]
//! enum.
//!
//! # Logging
//!
//! The package uses the [`log`](https://docs.rs/log/latest/log/) crate for logging messages
//! under the `toggle_engine` target. Consider integrating a `log`-compatible logger
//! implementation for better visibility into evaluation.
//!
//! # Examples
//!
//! A runnable example lives in the `demos/` directory of the crate repository.

#![warn(rustdoc::missing_crate_level_docs)]

mod client;
mod config;
mod constraints;
mod context;
mod dependencies;
mod error;
mod events;
mod repository;
mod variant;

pub mod models;
pub mod sharder;
pub mod strategy;

pub use client::Client;
pub use config::ClientConfig;
pub use constraints::ConstraintSource;
pub use context::Context;
pub use error::{Error, Result};
pub use events::{EvaluationError, Event, EventListener, ImpressionEvent, ImpressionKind, Warning};
pub use models::{
    ClientFeatures, Constraint, FeatureDefinition, Operator, ParentDependency, Segment,
    StrategySelector, VariantDefinition,
};
pub use repository::{FeatureStore, Repository, Snapshot};
pub use variant::{select_variant, select_variant_definition, Variant};
