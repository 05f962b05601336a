//! Client core for the CreditPro credit-management backend: cookie-session
//! REST access, role/permission evaluation and the Socket.IO chat relay.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod realtime;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
