pub mod button;
pub mod flash;
