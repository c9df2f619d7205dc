//! Typed access to the service's collections on top of a `DocumentStore`.

pub mod cart;
pub mod catalogue;
pub mod chats;
pub mod friend_requests;
pub mod games;
pub mod purchases;
pub mod users;
