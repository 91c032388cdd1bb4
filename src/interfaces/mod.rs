//! Outer adapters translating between the engines and external formats.

pub mod csv;
