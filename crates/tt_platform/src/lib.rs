pub mod keymap;
pub mod window;
