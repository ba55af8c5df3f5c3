pub mod accounts;
pub mod calls;
pub mod confessions;
pub mod conversations;
pub mod maintenance;
pub mod matching;
pub mod notifications;
pub mod profiles;
pub mod safety;
pub mod stats;

pub use notifications::Notifier;
