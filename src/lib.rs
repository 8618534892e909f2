//! adfeed: session bootstrap for the ad feed.
//!
//! ARCHITECTURE
//! ============
//! `bootstrap` owns the process-wide session state and drives it from two
//! collaborators: an [`auth::AuthProvider`] and a [`profile::ProfileStore`].
//! Each collaborator has a Postgres and a hosted-REST implementation; `config`
//! picks one pair at startup. `access` answers role checks against the
//! resolved state.

pub mod access;
pub mod auth;
pub mod bootstrap;
pub mod config;
pub mod db;
pub mod profile;
pub mod rest;
pub mod timeout;

pub use bootstrap::{BootstrapConfig, BootstrapError, BootstrapState, DemotionPolicy, SessionBootstrapper};
