//! Anagrafe is a small, self-hosted user directory service. It keeps a single
//! `users` table in PostgreSQL and exposes it as a JSON CRUD API.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
