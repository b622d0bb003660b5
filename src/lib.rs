pub mod cli;
pub mod utils;

pub use cli::*;
pub use utils::*;
