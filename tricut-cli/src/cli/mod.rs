pub mod analyze;
pub mod args;
pub mod bench;
pub mod render;
pub mod wav;
