pub mod config;
pub mod permissions;
pub mod preview;
pub mod window;

pub use config::*;
pub use permissions::*;
pub use preview::*;
pub use window::*;
