//! Button-driven real-time clock with a two-entry save log in EEPROM.
//!
//! The pieces that decide behaviour (mode machine, debounce filter, log
//! records, EEPROM protocol, screen text) are board-independent and tested
//! on the host. Board glue lives in `hardware` behind the `firmware` feature.

#![cfg_attr(not(test), no_std)]

pub mod clock;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod hardware;
pub mod logbook;
pub mod machine;
pub mod view;

#[cfg(test)]
mod testing;
