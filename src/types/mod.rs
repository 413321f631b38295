pub mod backtest;
pub mod failure;
pub mod forecast;
pub mod indicators;
pub mod market;
pub mod request;
pub mod signals;

pub use backtest::*;
pub use failure::*;
pub use forecast::*;
pub use indicators::*;
pub use market::*;
pub use request::*;
pub use signals::*;
