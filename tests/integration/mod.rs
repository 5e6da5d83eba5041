//! Integration tests for the statemux store

mod config_integration;
mod provider_updates;
mod registration;
