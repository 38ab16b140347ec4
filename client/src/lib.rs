pub mod auth;
pub mod client;
pub mod config;
pub mod session;
pub mod supabase;
