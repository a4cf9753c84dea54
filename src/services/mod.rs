//! Mutation hooks that keep the edge cache in step with the database

pub mod event_service;

pub use event_service::EventService;
