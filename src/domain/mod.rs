//! Domain layer: cart and notification types, their pure state transitions,
//! and the ports the engines depend on.

pub mod cart;
pub mod notification;
pub mod ports;
