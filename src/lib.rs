//! Rate-limited client for the CRPT "create document" API.
//!
//! Documents handed to [`api::CrptApi::create_document`] are queued without
//! blocking and released to the HTTP endpoint at no more than the configured
//! number of requests per window. Every submission gets exactly one attempt;
//! its outcome is logged, counted and delivered on a report channel.

pub mod api;
pub mod functions;
pub mod metrics;
pub mod models;
pub mod settings;
pub mod utility;
