//! termshell: menus, forms and tables for plain text consoles.

pub mod config;
pub mod console;
pub mod error;
pub mod form;
pub mod menu;
pub mod table;
pub mod types;
