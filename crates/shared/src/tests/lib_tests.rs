use std::collections::HashMap;

use crate::{
    domain::{ArticleId, ReportItemType, UserId},
    error::{ApiError, ErrorCode},
    model::{Message, Reaction, LIKE_REACTION},
    protocol::ArticlesResponse,
};

#[test]
fn ids_serialize_as_plain_strings() {
    let json = serde_json::to_string(&ArticleId::new("a-1")).expect("serialize");
    assert_eq!(json, "\"a-1\"");

    let map: HashMap<UserId, u32> = serde_json::from_str(r#"{"u1": 3}"#).expect("deserialize");
    assert_eq!(map.get(&UserId::from("u1")), Some(&3));
}

#[test]
fn articles_response_tolerates_missing_maps() {
    let response: ArticlesResponse =
        serde_json::from_str(r#"{"hottests":[{"id":"h1","item_id":"a1"}]}"#).expect("decode");
    assert_eq!(response.hottests.len(), 1);
    assert!(response.project_map.is_empty());
    assert!(!response.hottest_has_more);
}

#[test]
fn message_like_helpers_only_count_like_reactions() {
    let me = UserId::from("me");
    let message = Message {
        reactions: vec![
            Reaction {
                kind: LIKE_REACTION.to_string(),
                user_id: me.clone(),
            },
            Reaction {
                kind: "clap".to_string(),
                user_id: UserId::from("other"),
            },
        ],
        ..Message::default()
    };
    assert_eq!(message.like_count(), 1);
    assert!(message.liked_by(&me));
    assert!(!message.liked_by(&UserId::from("other")));
}

#[test]
fn status_codes_map_to_error_codes() {
    assert_eq!(ErrorCode::from_status(401), ErrorCode::Unauthorized);
    assert_eq!(ErrorCode::from_status(422), ErrorCode::Validation);
    assert_eq!(ErrorCode::from_status(503), ErrorCode::Internal);
    assert!(ApiError::new(ErrorCode::Unauthorized, "expired").requires_reauth());
}

#[test]
fn report_item_type_uses_backend_names() {
    assert_eq!(ReportItemType::Article.as_str(), "project");
    let json = serde_json::to_string(&ReportItemType::Comment).expect("serialize");
    assert_eq!(json, "\"comment\"");
}
