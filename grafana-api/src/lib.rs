/*
 * Grafana rust api client
 *
 * SPDX-License-Identifier: Apache-2.0
 */
//! # Grafana Rust API Client
//!
//! A client for the Grafana HTTP management API, covering the entity kinds
//! needed to migrate configuration state between instances:
//! folders, dashboards, datasources, alert rules, and preferences.
//!
//! ## Features
//!
//! - bearer-token (`glsa_`/JWT/api-key) and session-cookie authentication
//! - connectivity verification with transparent unverified-TLS fallback
//! - http middleware with bounded retry and backoff for idempotent reads
//! - typed entity models that preserve unmodeled fields via serde flatten
//! - ruler response flattening for alert rule enumeration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use grafana_api::prelude::*;
//! # async fn example() -> Result<(), GrafanaError> {
//! let credential = Credential::parse("glsa_xxxxxxxx");
//! let client = GrafanaClient::connect("https://grafana.local", credential).await?;
//!
//! for folder in client.list_folders().await? {
//!     println!("{} ({})", folder.title, folder.uid);
//! }
//! # Ok(())
//! # }
//! ```

#![allow(clippy::missing_errors_doc)] // pedantic
#![allow(clippy::missing_const_for_fn)] //  nursery function
#![allow(clippy::must_use_candidate)] // pedantic
#![warn(clippy::default_trait_access)]
#![warn(clippy::doc_markdown)]
#![warn(clippy::explicit_iter_loop)]
#![warn(clippy::future_not_send)]
#![warn(clippy::implicit_clone)]
#![warn(clippy::literal_string_with_formatting_args)]
#![warn(clippy::match_same_arms)]
#![warn(clippy::option_if_let_else)]
#![warn(clippy::redundant_clone)]
#![warn(clippy::ref_option)]
#![warn(clippy::redundant_closure)]
#![warn(clippy::uninlined_format_args)]
#![warn(clippy::unnecessary_wraps)]
#![warn(clippy::unused_async)]

pub mod alerting;
pub mod auth;
pub mod client;
pub mod dashboards;
pub mod datasources;
pub mod error;
pub mod folders;
mod http_client;
pub mod preferences;

/// Result type alias using `GrafanaError` as the default error.
pub type Result<T, E = crate::error::GrafanaError> = std::result::Result<T, E>;

/// Prelude module - import (nearly) all the things with `use grafana_api::prelude::*;`
pub mod prelude {
    pub use crate::error::*;
    pub use crate::{
        // Alert rules
        alerting::AlertRule,
        // Credentials
        auth::{Credential, CredentialKind},
        client::{ClientConfig, GrafanaClient},
        // Dashboards
        dashboards::{DashboardEntry, DashboardImportRequest, DashboardMeta, SearchHit},
        // Datasources
        datasources::Datasource,
        // Folders
        folders::{Folder, GENERAL_FOLDER_ID, NewFolder},
        // Preferences
        preferences::Team,
    };
}

pub(crate) mod config {
    /// User-Agent sent with every request
    pub const USER_AGENT: &str = "dashmove";

    /// Header that marks provisioned resources as editable
    pub const PROVENANCE_HEADER: &str = "x-disable-provenance";

    /// Endpoint used for the one-time connectivity check
    pub const PERMISSIONS_PATH: &str = "/api/access-control/user/permissions";

    /// Max retries for idempotent HTTP requests
    pub const MAX_RETRIES: u32 = 3;
}
