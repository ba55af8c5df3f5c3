pub mod users;
pub mod swipes;
pub mod matches;
pub mod messages;
pub mod calls;
pub mod confessions;
pub mod notifications;

pub use users::{User, Photo, FilterPreferences, Location, Candidate, NewUser, ProfileUpdate, PublicProfile};
pub use swipes::{Swipe, SwipeDirection};
pub use matches::{Match, ChatSummary, LastMessage};
pub use messages::Message;
pub use calls::{Call, CallStatus, CallType};
pub use confessions::Confession;
pub use notifications::{Notification, NotificationType};
