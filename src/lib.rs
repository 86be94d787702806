//! Lead submission service for the auto-service website.
//!
//! Accepts leads from the site's calculator, final and modal booking
//! forms, validates and normalizes them, mails a notification to the
//! business and records each attempt in an append-only log.
//!
//! # Modules
//!
//! - `app`: Router construction and HTTP middleware.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `handlers`: HTTP request handlers and body decoding.
//! - `mailer`: Mail transport abstraction and `lettre` implementation.
//! - `models`: Lead data models.
//! - `notification`: Notification subject and body formatting.
//! - `phone`: Phone normalization, formatting and input masking.
//! - `submission`: The validate → mail → log pipeline.
//! - `submission_log`: Append-only success/failure logs.
//! - `validation`: Field cleaning and lead validation.

pub mod app;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod mailer;
pub mod models;
pub mod notification;
pub mod phone;
pub mod submission;
pub mod submission_log;
pub mod validation;
