//! # Illustres Common Library
//!
//! Shared code for the Femmes Illustres map services:
//! - Portrait and geo-trace record models, envelope normalization
//! - Coordinate extraction from heterogeneous geographic encodings
//! - Name-based reconciliation of the two collections
//! - Walking route construction
//! - Configuration loading

pub mod config;
pub mod error;
pub mod geo;
pub mod reconcile;
pub mod records;
pub mod route;

pub use error::{Error, Result};
pub use geo::{Bounds, Coordinate};
pub use reconcile::{normalize_name, Reconciler};
pub use records::{GeoTraceRecord, PortraitRecord};
pub use route::{build_route, RoutePath};
