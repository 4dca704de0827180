//! Water Potability API
//!
//! HTTP service that validates water-quality samples and predicts whether the
//! water is drinkable using a model artifact loaded once at startup.
//!
//! ## Architecture
//!
//! 1. **Handler** (`handler/`): axum router, shared state, the error envelope.
//!
//! 2. **Config** (`config`): defaults, TOML file and CLI/env overrides.
//!
//! 3. **Telemetry** (`telemetry`): tracing setup and Prometheus metrics.
//!
//! 4. **Server** (`server`): model loading and the listen loop.
//!
//! 5. **CLI** (`cli`): `serve`, `predict` and `inspect-model`.
//!
//! ## CLI Usage
//!
//! ```bash
//! # Serve on port 8000 with a JSON artifact
//! potability-server serve --model model.json
//!
//! # One-shot prediction from stdin
//! echo '{"ph": 7.0, ...}' | potability-server predict --model model.json
//!
//! # Describe an artifact
//! potability-server inspect-model --model forest.yaml
//! ```

pub mod cli;
pub mod config;
pub mod handler;
pub mod server;
pub mod telemetry;

pub use config::{ConfigError, ConfigOverrides, LogFormat, ServerConfig};
pub use handler::{create_router, ApiError, HandlerState};
pub use server::{build_app, build_state, serve};
pub use telemetry::{init_tracing, MetricsError, PredictionMetrics};
