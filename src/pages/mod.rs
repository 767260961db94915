pub mod diagram;
pub mod not_found;
