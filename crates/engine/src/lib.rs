pub mod classifier;
pub mod gate;
pub mod risk_calculator;
pub mod simulator;
