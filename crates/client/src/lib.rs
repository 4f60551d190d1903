//! Client side of edgecache.
//!
//! This crate provides:
//! - The network layer (`Network` trait, reqwest-backed `FetchClient`, URL handling)
//! - The cache controller: request classification, caching strategies,
//!   install/activate lifecycle and the page-side message protocol
//! - The progressive list loader

pub mod controller;
pub mod fetch;
pub mod loader;

#[cfg(test)]
mod testing;

pub use controller::{
    CacheController, CacheStatus, ClassificationRules, ControlMessage, ControllerHandle, ControllerSettings,
    InstallReport, Lifecycle, ResponseSource, Rule, Served, Strategy, spawn_message_loop,
};
pub use fetch::{Destination, FetchClient, FetchConfig, Network, Request, RequestMode};
pub use loader::{
    Container, FilterForm, HttpListSource, ListSource, LoadOutcome, LoadPhase, LoaderConfig, LoaderEvent,
    LoaderTiming, Notifier, PaginationState, ProgressiveLoader, ScrollMetrics, Severity,
};
