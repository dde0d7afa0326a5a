//! Core runtime for SCM plugin methods.
//!
//! A plugin method pairs a declarative parameter schema with an external API
//! endpoint. This crate provides the building blocks: definition types
//! ([`method`]), parameter validation ([`params`]), the startup registry
//! ([`registry`]), credential routing ([`credentials`]), persisted
//! configuration ([`config`]), and the [`controller`] that executes one
//! bounded upstream call per invocation.
//!
//! Provider crates depend on this one and export registration lists; the
//! host process wires a [`registry::SharedRegistry`] and a
//! [`config::ConfigStore`] into a [`controller::Controller`].

pub mod config;
pub mod controller;
pub mod credentials;
pub mod error;
pub mod method;
pub mod params;
pub mod registry;

pub use controller::{Controller, MethodResponse};
pub use error::{PluginError, Result};
pub use method::{ApiEndpoint, MethodMetadata, ParamKind, ParameterDefinition, PluginMethod};
pub use registry::{ProviderMethods, Registry, SharedRegistry};
