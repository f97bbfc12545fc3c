// Pick'em core: domain model, pick store and diff, selection workflow,
// configuration and session persistence.

pub mod config;
pub mod db;
pub mod models;
pub mod notice;
pub mod picks;
pub mod workflow;
