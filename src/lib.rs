//! Generator for the C++ MODBUS register definitions of CAPAROC devices.
//!
//! The register table published for the CAPAROC power modules is scraped from its HTML form
//! ([`extract`]), turned into [`registers::RegisterRecord`]s ([`registers::normalize`]) and
//! rendered as `registers_generated.hpp` ([`emit`]).

pub mod commands;
pub mod emit;
pub mod extract;
pub mod input;
pub mod output;
pub mod registers;
