//! Service layer separating file handling from the removal pipeline

pub mod io;

pub use io::ImageIOService;
