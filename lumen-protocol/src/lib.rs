//! ST7789 Parallel-Bus Protocol
//!
//! This crate defines the bit-exact byte protocol spoken to ST7789-class
//! panel controllers over an 8-bit 8080-style bus. It has no hardware
//! dependencies; the display engine feeds the bytes it produces into a
//! `ParallelBus`.
//!
//! # Protocol Overview
//!
//! Every exchange is a command byte (DC low) followed by zero or more
//! parameter bytes (DC high). Pixel writes set a window first:
//! ```text
//! ┌───────┬───────────────────────┬───────┬───────────────────────┬───────┬──────────────┐
//! │ CASET │ XS_H XS_L XE_H XE_L   │ RASET │ YS_H YS_L YE_H YE_L   │ RAMWR │ RGB565 MSB.. │
//! │ 0x2A  │ 4B                    │ 0x2B  │ 4B                    │ 0x2C  │ 2B per pixel │
//! └───────┴───────────────────────┴───────┴───────────────────────┴───────┴──────────────┘
//! ```
//!
//! The bus has no acknowledge path. A wrong window or a mis-ordered byte
//! is only visible as corruption on the glass.

#![no_std]
#![deny(unsafe_code)]

pub mod commands;
pub mod init;
pub mod pixel;
pub mod sequence;
pub mod window;

pub use commands::Orientation;
pub use init::{init_sequence, InitStep, INIT_STEPS};
pub use pixel::{encode_pixels, rgb565, to_wire, BYTES_PER_PIXEL};
pub use sequence::{CommandTrace, RecordedCommand, SequenceDifference, ValidationReport};
pub use window::{coordinate_params, AddressWindow};
