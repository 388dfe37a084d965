//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: mutex-guarded repositories for development and tests
//! - **assets**: Cloudinary and local-disk photo hosts
//! - **security**: bcrypt password hashing and JWT bearer tokens
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no business logic.

pub mod assets;
pub mod memory;
pub mod persistence;
pub mod security;
