//! Core value types shared by the trading system and (via `Datetime`/
//! `TimeDelta`) the timer scheduler.

mod bar;
mod cost;
mod order_request;
mod position;
mod stock;
mod time;
mod trade;

pub use bar::KRecord;
pub use cost::CostRecord;
pub use order_request::{Direction, OrderRequest};
pub use position::PositionRecord;
pub use stock::Stock;
pub use time::{datetime_from_date_and_time, hms, Datetime, TimeDelta};
pub use trade::{Business, Part, TradeRecord};
