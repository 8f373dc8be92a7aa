/*!
# Project Dashboard

A single-project status report with autosave, built in Rust.

## Overview

The report is one flat document: a set of text fields describing the project
(identity, contract, budget, progress, payments, risks) plus three editable
row lists (program stages, this week's actions, next week's actions). It is
loaded once from a key/value gateway, edited locally, and written back after
every burst of edits.

## Architecture

### Synchronizer
- **Load**: one read on start-up; stored values are merged over the default
  document. Missing or unreadable storage silently leaves the defaults.
- **Edit**: every edit produces a new immutable snapshot.
- **Autosave**: a single debounce timer is re-armed on each edit; after a
  quiet period the latest snapshot is written. Failures are logged and never
  surfaced as errors.

### Gateway
- **Client**: `GET` returns field name → string value, `POST` sends the whole
  document as a JSON object.
- **Server**: an axum route over a two-column range (header row `key`,
  `value`), kept in memory or in a gzip-compressed bincode file.

### Indicators
- Stage status (Ahead / Delay / On Track) from planned against actual stage
  progress, rounded to the nearest 5%
- Resource balance, cost performance index and cash variance
- Overall progress bar colour

## Modules

- **report**: The document model, field names and immutable edit helpers
- **codec**: Conversion between the document and its key/value storage form
- **metrics**: Lenient number parsing and every derived indicator
- **gateway**: The gateway trait and its HTTP client
- **sync**: Load lifecycle, edits and debounced autosave
- **store**: Backing range for the gateway server
- **saving**: Range persistence with compression
- **config**: Command-line and environment options
- **render**: Plain-text report for the terminal
- **command**: Terminal dashboard commands
- **app**: Gateway server routing (feature `web`)

## Binaries

- `project-dashboard` - interactive terminal editor
- `gateway` - the gateway server
*/

pub mod codec;
pub mod command;
pub mod config;
pub mod gateway;
pub mod metrics;
pub mod render;
pub mod report;
pub mod saving;
pub mod store;
pub mod sync;

#[cfg(feature = "web")]
pub mod app;

pub use gateway::{Gateway, GatewayError, HttpGateway};
pub use report::{ActionRow, Collection, EditError, Field, ProgramRow, ProjectReport, RowField};
pub use sync::{Edit, Session, SyncConfig, SyncStatus, Synchronizer};
