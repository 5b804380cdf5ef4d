pub mod kii_http;
pub mod object_backend;
