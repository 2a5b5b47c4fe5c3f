mod client_config;
pub use client_config::*;
mod error;
pub use error::*;
mod notification;
pub use notification::*;
mod progress;
pub use progress::*;
mod video;
pub use video::*;
