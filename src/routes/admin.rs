mod login;
mod messages;
mod newsletters;
mod stats;
mod subscribers;
pub use login::*;
pub use messages::*;
pub use newsletters::*;
pub use stats::*;
pub use subscribers::*;
