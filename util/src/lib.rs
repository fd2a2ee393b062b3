pub mod bus;
pub mod config;
pub mod jwt;
pub mod qr;
pub mod state;
