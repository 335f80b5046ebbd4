pub mod fingerprint_cache;
pub mod fingerprint_filter;
