mod catalogue_item;
mod chat_message;
mod friend_request;
mod owned_game;
mod purchase;
mod recommendation;
mod user_profile;

pub use catalogue_item::*;
pub use chat_message::*;
pub use friend_request::*;
pub use owned_game::*;
pub use purchase::*;
pub use recommendation::*;
pub use user_profile::*;
