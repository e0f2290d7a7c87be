//! Resources whose wire format is not a flat field copy

pub mod as3;
pub mod pool_attachment;
pub mod ssl;
pub mod waf_policy;
