//! Pariksha - An exam-preparation platform
//!
//! This library provides the core functionality for the Pariksha platform:
//! a question bank with translations, quizzes with guest-capable attempts,
//! a content catalog, and Google OAuth sign-in.

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
