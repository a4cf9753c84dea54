pub mod ip;
pub mod redis;
