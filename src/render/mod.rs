pub mod arena;
pub mod command;
pub mod device;
pub mod headless;
pub mod renderer;
pub mod submission;
pub mod target;
