//! Reads a uPD2764 parallel EPROM by driving its pins from general-purpose
//! I/O lines, and dumps its contents as Intel HEX.

#![warn(missing_docs)]

pub mod bus;
pub mod config;
pub mod dump;
pub mod hex;
pub mod line;
pub mod rom;
pub mod verify;
pub mod view;
