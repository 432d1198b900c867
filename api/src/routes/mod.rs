pub mod activities;
pub mod advice;
pub mod auth;
pub mod health;
