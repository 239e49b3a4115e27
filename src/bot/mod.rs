//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules for better organization:
//! - `message_handler`: routing and the free-text input consumers
//! - `command_handlers`: /start, /admin and /addtrack
//! - `menu_handlers`: screen navigation driven by keyboard labels
//! - `keyboards`: reply keyboards and the label-to-action index
//! - `admin`: the authorization gate and the admin console actions

pub mod admin;
pub mod command_handlers;
pub mod keyboards;
pub mod menu_handlers;
pub mod message_handler;

// Re-export the pieces main.rs and the tests wire together
pub use admin::{AdminAccess, AdminGate, DeliveryOutcome};
pub use keyboards::{MenuAction, MenuIndex};
pub use message_handler::{message_handler, route_message, Route};
