//! A small blocking Rust client for the EPA Air Quality System (AQS) Data Mart API.
//!
//! Each query method issues a single GET against one AQS service and returns the
//! `Data` array as a [`ResultTable`], or a [`QueryError`] that says why there is no table:
//! the HTTP exchange failed, the service found no matching data, the query was malformed,
//! or the service rejected it.
//!
//! ## Quick start
//! - Configure credentials via environment variables (`AQS_EMAIL`, `AQS_KEY`, optionally
//!   `AQS_URL`) or a `.aqsrc` file (current directory or home directory), or pass a
//!   [`ClientConfig`] to [`Client::from_config`].
//! - Look up codes with the `list_*` methods, then fetch summaries.
//!
//! ```no_run
//! use anyhow::Result;
//! use aqsapi::Client;
//!
//! fn main() -> Result<()> {
//!     let client = Client::from_env()?;
//!     let states = client.list_state_codes()?;
//!     println!("{} states", states.len());
//!
//!     // PM2.5 FRM/FEM mass and ozone, North Carolina, 2020.
//!     let summary =
//!         client.annual_summary_by_state("37", &[88101, 44201], "20200101", "20201231")?;
//!     for row in summary.rows().take(5) {
//!         println!("{:?}", row);
//!     }
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]

mod client;
mod config;
mod endpoint;
mod error;
mod query;
mod response;
mod table;

pub use client::{Client, ClientConfig};
pub use config::DEFAULT_URL;
pub use endpoint::{Endpoint, EndpointFamily};
pub use error::{FailureKind, QueryError};
pub use table::ResultTable;
