pub mod gate;
pub mod health;
