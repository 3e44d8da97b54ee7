//! Rentman listing API client.

mod client;
mod dto;

pub use client::{RentmanClient, RetryPolicy};
