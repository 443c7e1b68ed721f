pub mod editing;
pub mod error;
pub mod io;

// Re-export key types for easier usage
pub use editing::*;
pub use error::EditError;
pub use io::*;
