//! TextWand Library
//!
//! Core modules for the TextWand selection-processing daemon.

pub mod apply;
pub mod backend;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod menu;
pub mod notify;
pub mod ops;
pub mod selection;
pub mod supervisor;
pub mod surface;
pub mod trigger;
pub mod watcher;
pub mod x11;
