pub mod chapter;
