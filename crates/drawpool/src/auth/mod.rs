mod guard;
mod message;

pub use guard::*;
pub use message::*;
