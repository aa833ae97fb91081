//! Client and schema model for the Pulse analytics API.
//!
//! - [`semantics`]: the cubes describing an application's data, split into
//!   endpoint cubes and raw table cubes, and their text rendering
//! - [`client`]: the [`PulseApi`] trait and its HTTP implementation
//! - [`query`]: endpoint and raw query request/result types
//!
//! # Example
//!
//! ```rust,ignore
//! use pulse::{PulseApi, PulseClient, PulseConfig, Semantics};
//!
//! let client = PulseClient::new(PulseConfig::from_env()?)?;
//! let semantics = Semantics::fetch(&client).await?;
//!
//! for cube in semantics.filter_endpoints().iter() {
//!     println!("endpoint: {}", cube.name);
//! }
//! let rows = client.raw_query("SELECT COUNT(*) FROM orders").await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod semantics;

pub use client::{PulseApi, PulseClient};
pub use config::PulseConfig;
pub use error::{PulseError, Result};
pub use query::{EndpointQueryParams, EndpointQueryResult, RawQueryResult, DEFAULT_PAGE_SIZE};
pub use semantics::{serialize_text, Cube, CubeKind, Dimension, Parameter, Semantics, SemanticsView};
