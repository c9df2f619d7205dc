use serde::{Deserialize, Serialize};

use crate::{documents::FriendRequest, log_event, logging::LogEvent, Status};

use super::Response;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum SocialEvent {
    SendRequest(SendRequest),
    ResolveRequest(ResolveRequest),
    RemoveFriend(RemoveFriend),
}

impl SocialEvent {
    pub fn send_request(from_id: &str, to_email: &str, response: &Result<FriendRequest, Status>) {
        log_event!(LogEvent::Social(SocialEvent::SendRequest(SendRequest {
            from_id: from_id.to_owned(),
            to_email: to_email.to_owned(),
            result: Response::of(response, |request| request.id.clone()),
        })))
    }

    pub fn resolve_request(
        op: &str,
        request_id: &str,
        response: &Result<FriendRequest, Status>,
    ) {
        log_event!(LogEvent::Social(SocialEvent::ResolveRequest(
            ResolveRequest {
                op: op.to_owned(),
                request_id: request_id.to_owned(),
                result: Response::of(response, |request| {
                    request.status.as_str().to_owned()
                }),
            }
        )))
    }

    pub fn remove_friend(user_id: &str, friend_id: &str, response: &Result<(), Status>) {
        log_event!(LogEvent::Social(SocialEvent::RemoveFriend(RemoveFriend {
            user_id: user_id.to_owned(),
            friend_id: friend_id.to_owned(),
            result: Response::of(response, |_| String::from("removed")),
        })))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SendRequest {
    from_id: String,
    to_email: String,
    result: Response,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ResolveRequest {
    op: String,
    request_id: String,
    result: Response,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RemoveFriend {
    user_id: String,
    friend_id: String,
    result: Response,
}
