//! reqsync - Python project environment and dependency manager library
//!
//! This library provides the core functionality for keeping a project's
//! declared dependencies (pyproject.toml) in step with its virtualenv:
//! - PEP 508 requirement parsing with canonical names and markers
//! - Dependency group reconciliation without duplicates
//! - Requirements snapshots expanded through published extras
//! - pip / pyenv integration and project scaffolding

pub mod cli;
pub mod domain;
pub mod environment;
pub mod error;
pub mod manifest;
pub mod output;
pub mod parser;
pub mod progress;
pub mod project;
pub mod reconciler;
pub mod registry;
pub mod scaffold;
