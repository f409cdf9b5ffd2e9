pub mod assets;
pub mod tobacco;
