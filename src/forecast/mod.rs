pub mod cache;
pub mod client;
pub mod error;
pub mod openweather;
pub mod pipeline;
pub mod throttle;
