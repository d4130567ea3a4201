//! # Land Registry
//!
//! Ingests the UK land registry's two bulk ownership datasets (UK companies,
//! "CCOD", and overseas companies, "OCOD") into a local SQLite store of
//! titles, owners and title–owner links, and answers exact and prefix
//! lookups against it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────────────────┐   ┌──────────┐
//! │  CCOD/OCOD  │──▶│ canonicalize → reshape → │──▶│  SQLite   │
//! │  CSV / ZIP  │   │   build tables           │   │  store    │
//! └─────────────┘   └──────────────────────────┘   └────┬─────┘
//!                                                       │
//!                                                       ▼
//!                                                 ┌──────────┐
//!                                                 │  query   │
//!                                                 │ (landreg)│
//!                                                 └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! landreg init                              # create an empty store
//! landreg build                             # ingest both extracts
//! landreg title AB123                       # title → owners
//! landreg owner "Smith Ltd"                 # owner → titles
//! landreg complete "smi"                    # owner-name autocomplete
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`canonical`] | Owner-name and address canonicalization |
//! | [`dataset`] | Decoding of the two extracts |
//! | [`reshape`] | Proprietor-column unpivoting |
//! | [`tables`] | Titles, owners and links derivation |
//! | [`store`] | Full-replace persistence |
//! | [`query`] | Title and owner lookups |
//! | [`ingest`] | Build orchestration |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema and indexes |

pub mod canonical;
pub mod config;
pub mod dataset;
pub mod db;
pub mod error;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod migrate;
pub mod models;
pub mod progress;
pub mod query;
pub mod reshape;
pub mod stats;
pub mod store;
pub mod tables;
