pub mod api;
pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod state;
pub mod users;

#[cfg(test)]
pub(crate) mod test_utils;
