pub mod allocation;
pub mod deal;
pub mod engine;
pub mod rate;
