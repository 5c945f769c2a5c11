pub mod aqi;
pub mod forecast;
pub mod time;

pub use aqi::*;
pub use forecast::*;
pub use time::*;
