pub mod classifier;
pub mod loader;
pub mod play;
pub mod store;
