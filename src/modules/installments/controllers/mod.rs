pub mod emi_controller;

pub use emi_controller::configure;
