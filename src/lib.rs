pub mod db;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod models;
pub mod parsing;
pub mod pipeline;
pub mod utils;
