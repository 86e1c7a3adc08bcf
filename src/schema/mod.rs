pub mod dimensions;
pub mod types;

pub use dimensions::*;
pub use types::*;
