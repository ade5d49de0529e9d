pub mod payout;
pub mod ports;
