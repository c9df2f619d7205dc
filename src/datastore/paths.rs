use std::fmt;

/// Path of a collection, either top-level (`users`) or nested under a parent
/// document (`users/{uid}/games`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CollectionPath {
    parent: Option<String>,
    name: String,
}

impl CollectionPath {
    pub fn root(name: &str) -> Self {
        CollectionPath {
            parent: None,
            name: name.to_owned(),
        }
    }

    pub fn nested(parent: &DocPath, name: &str) -> Self {
        CollectionPath {
            parent: Some(parent.to_string()),
            name: name.to_owned(),
        }
    }

    /// Relative path of the parent document, e.g. `users/u1`.
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn doc(&self, id: impl Into<String>) -> DocPath {
        DocPath {
            collection: self.clone(),
            id: id.into(),
        }
    }

    pub fn users() -> Self {
        Self::root(USERS)
    }

    pub fn owned_games(user_id: &str) -> Self {
        Self::nested(&Self::users().doc(user_id), GAMES)
    }

    pub fn cart(user_id: &str) -> Self {
        Self::nested(&Self::users().doc(user_id), CART)
    }

    pub fn catalogue() -> Self {
        Self::root(CATALOGUE)
    }

    pub fn friend_requests() -> Self {
        Self::root(FRIEND_REQUESTS)
    }

    pub fn purchases() -> Self {
        Self::root(PURCHASES)
    }

    pub fn messages(conversation_id: &str) -> Self {
        Self::nested(&Self::root(CHATS).doc(conversation_id), MESSAGES)
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.parent {
            Some(parent) => write!(f, "{parent}/{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Path of a single document.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DocPath {
    collection: CollectionPath,
    id: String,
}

impl DocPath {
    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

pub const USERS: &str = "users";
pub const GAMES: &str = "games";
pub const CART: &str = "cart";
pub const CATALOGUE: &str = "catalogue";
pub const FRIEND_REQUESTS: &str = "friend_requests";
pub const PURCHASES: &str = "purchases";
pub const CHATS: &str = "chats";
pub const MESSAGES: &str = "messages";
