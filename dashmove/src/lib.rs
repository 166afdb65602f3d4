/*
 * dashmove - migrate Grafana dashboards, datasources, alert rules,
 * folders, and preferences between instances
 *
 * SPDX-License-Identifier: Apache-2.0
 */
//! Snapshot-based migration of Grafana configuration state.
//!
//! An export run captures folders, dashboards, datasources, alert rules,
//! and preferences from one instance into a snapshot file; an import run
//! replays a snapshot against another instance, either additively (merge)
//! or destructively (override). Imports are idempotent: replaying a
//! snapshot against an unchanged target writes nothing.

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::must_use_candidate)]
#![warn(clippy::default_trait_access)]
#![warn(clippy::doc_markdown)]
#![warn(clippy::explicit_iter_loop)]
#![warn(clippy::implicit_clone)]
#![warn(clippy::literal_string_with_formatting_args)]
#![warn(clippy::match_same_arms)]
#![warn(clippy::redundant_clone)]
#![warn(clippy::ref_option)]
#![warn(clippy::redundant_closure)]
#![warn(clippy::uninlined_format_args)]
#![warn(clippy::unnecessary_wraps)]
#![warn(clippy::unused_async)]

pub mod cli;
pub mod filter;
pub mod migrate;
pub mod purge;
pub mod reconcile;
pub mod resolve;
pub mod rewrite;
pub mod snapshot;
