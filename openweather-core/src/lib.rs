//! Core library for the `openweather` CLI.
//!
//! This crate defines the current-weather lookup pipeline:
//! - Endpoint building from a location query and an injected API key
//! - Fetching and decoding the provider response
//! - Projecting the decoded model into display strings
//! - Orchestrating requests and publishing the current outcome
//!
//! It is used by `openweather-cli`, but any other front end can drive
//! [`RequestOrchestrator`] and subscribe to its state.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod projector;
pub mod query;

pub use client::{HttpWeatherClient, WeatherFetcher};
pub use config::Config;
pub use error::{ErrorKind, WeatherError};
pub use model::WeatherModel;
pub use orchestrator::{FetchOutcome, RequestOrchestrator, Snapshot};
pub use projector::{Projection, project};
pub use query::{EndpointBuilder, LocationQuery, QueryVariant};
pub use reqwest::Url;
