pub mod shared;
pub mod tobacco;
