//! adcform Core
//!
//! Core library for reconciling declared appliance configuration against the
//! objects that actually exist on an application delivery controller

pub mod config;
pub mod differ;
pub mod effect;
pub mod interpreter;
pub mod plan;
pub mod provider;
pub mod resource;
pub mod schema;
