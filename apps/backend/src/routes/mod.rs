//! HTTP route handlers

pub mod auth;
pub mod decks;
pub mod exams;
pub mod materials;
pub mod predictions;
pub mod tutor;
pub mod users;
