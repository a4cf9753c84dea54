//! HTTP edge surface

pub mod services;
