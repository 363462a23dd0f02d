//! Trigger manager service.
//!
//! Keeps the links between event URIs and Codefresh pipelines and starts those pipelines
//! when the ingress hands over an event.

pub mod config;
pub mod http;
