//! Data Transfer Objects for the admin and health endpoints.

pub mod health;
pub mod publish;
