//! # iterscope - Development Iteration Profiler
//!
//! Breaks development iterations (script compilation, assembly reloads,
//! entering and leaving play mode) down into nested timed spans, and exports
//! them as CSV, Chrome trace JSON, HTML or plain text.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                    Host (editor / replay)                     │
//! │    lifecycle notifications          sampled-frame snapshots   │
//! └───────────────┬──────────────────────────────┬────────────────┘
//!                 │ HostEvent (crossbeam)        │ ProfilingSource
//!                 ▼                              ▼
//! ┌───────────────────────────────────────────────────────────────┐
//! │                   ProfilerContext (this crate)                │
//! │                                                               │
//! │  ┌──────────────┐  arm   ┌──────────────┐  match ┌──────────┐ │
//! │  │  Lifecycle   │──────▶│Marker Search │──────▶│  Sample  │ │
//! │  │  Collector   │        │  Scheduler   │        │ Importer │ │
//! │  └──────┬───────┘        └──────────────┘        └────┬─────┘ │
//! │         │ placeholders                                │      │
//! │         ▼                                             ▼      │
//! │  ┌─────────────────────────────────────────────────────────┐  │
//! │  │        IterationRegistry (one EventTree per iteration)  │  │
//! │  └───────────────────────────┬─────────────────────────────┘  │
//! │                              ▼                                │
//! │  ┌──────────────┐    ┌──────────────┐                         │
//! │  │   Analysis   │◀──│    Export    │ csv / json / html / txt │
//! │  │ (categories) │    │ (reporters)  │                         │
//! │  └──────────────┘    └──────────────┘                         │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`iteration`]: event nodes, per-iteration trees and the registry
//! - [`profiling`]: snapshot source boundary, recorded sessions, marker tables,
//!   the budgeted marker search and the sample importer
//! - [`analysis`]: regex category aggregation and the filtered tree view
//! - [`export`]: the reporter trait, built-in formats and the format registry
//! - [`context`]: the explicit object hosts drive
//! - [`host`]: channel-driven event loop
//! - [`config`]: settings and the report header
//! - [`cli`]: command-line argument parsing
//! - [`domain`]: index newtypes and error enums
//!
//! ## Key Concepts
//!
//! - **Iteration**: one compile / reload / play mode transition, one tree
//! - **Placeholder**: an untimed span created when a phase starts; it gets its
//!   window from the samples imported under it
//! - **Frame budget**: how many snapshots a placeholder waits for its markers
//!   before it is given up

pub mod analysis;
pub mod cli;
pub mod config;
pub mod context;
pub mod domain;
pub mod export;
pub mod host;
pub mod iteration;
pub mod profiling;
