pub mod menu;
pub mod screen;
