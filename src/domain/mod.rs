//! Core domain models for reqsync
//!
//! This module contains the fundamental types used throughout the application:
//! - Package names with canonical identity
//! - Version specifiers and environment markers
//! - Parsed requirements
//! - Dependency groups and group selection

mod group;
mod marker;
mod name;
mod requirement;
mod specifier;

pub use group::{DependencyGroup, GroupSelector, ALL_GROUPS};
pub use marker::{MarkerExpression, MarkerOperator, MarkerTree, MarkerValue, MarkerVariable};
pub use name::{is_valid_name, normalize_name, PackageName};
pub use requirement::Requirement;
pub use specifier::{is_version_char, Operator, VersionSpecifier};
