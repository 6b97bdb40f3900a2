//! # TaskPing Channels
//! Delivery channel implementations. Telegram is the only channel the
//! product ships today; anything implementing
//! [`taskping_core::DeliveryAdapter`] can stand in.

pub mod telegram;

pub use telegram::TelegramDelivery;
