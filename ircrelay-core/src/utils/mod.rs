pub mod backoff;
pub mod patterns;
