//! Request middleware.

pub mod lockdown;

pub use lockdown::lockdown_middleware;
