pub mod chat;
pub mod firestore;
pub mod manager;
pub mod social;
pub mod store;
pub mod user;

pub use chat::ChatManager;
pub use manager::{AchievementSummary, GameAchievements, LibraryManager};
pub use social::{FriendSummary, SocialManager};
pub use store::{Cart, StoreManager};
pub use user::{ProfileUpdate, User};
