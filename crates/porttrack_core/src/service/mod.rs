//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep transport and CLI layers decoupled from storage details.

pub mod container_service;
