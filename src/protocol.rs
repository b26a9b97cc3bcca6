use serde::{Deserialize, Serialize};

/// A single chat message submitted by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptObject {
    pub content: String,
    pub id: String,
    pub role: String,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestObject {
    pub prompt: PromptObject,
    pub thread_id: String,
    pub response_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_uses_camel_case_ids() {
        let request: RequestObject = serde_json::from_value(json!({
            "prompt": {"content": "", "id": "m-1", "role": "user"},
            "threadId": "t-1",
            "responseId": "r-1"
        }))
        .unwrap();
        assert_eq!(request.thread_id, "t-1");
        assert_eq!(request.response_id, "r-1");
        assert!(request.prompt.content.is_empty());
    }

    #[test]
    fn every_field_is_required() {
        let missing_role = json!({
            "prompt": {"content": "hi", "id": "m-1"},
            "threadId": "t-1",
            "responseId": "r-1"
        });
        assert!(serde_json::from_value::<RequestObject>(missing_role).is_err());

        let numeric_thread = json!({
            "prompt": {"content": "hi", "id": "m-1", "role": "user"},
            "threadId": 7,
            "responseId": "r-1"
        });
        assert!(serde_json::from_value::<RequestObject>(numeric_thread).is_err());
    }
}
