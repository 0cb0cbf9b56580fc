// src/llm/models.rs
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields the extraction prompt asks for, in output column order.
pub const SCHEMA_FIELDS: [&str; 11] = [
    "File Name",
    "ISIN",
    "Issuer",
    "Ccy",
    "Underlying(s)",
    "Strike",
    "Launch Date",
    "Final Val. Day",
    "Maturity",
    "Cap",
    "Barrier",
];

// --- Chat completion wire format ---

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub response_format: ResponseFormat,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub format_type: &'static str,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self { format_type: "json_object" }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponseMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
}

impl ChatCompletionResponse {
    /// Content of the first choice, if the service sent any.
    pub fn into_content(self) -> Option<String> {
        self.choices.into_iter().next().and_then(|choice| choice.message.content)
    }
}

// --- Extraction outcome ---

/// What came back for one document.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult {
    /// The response was a JSON object.
    Parsed(Map<String, Value>),
    /// The response was text that is not a JSON object.
    Malformed(String),
    /// The service answered without content.
    Absent,
    /// The call failed after all retries; carries the error message.
    Failed(String),
}

impl ExtractionResult {
    /// Classifies the raw completion content.
    pub fn from_response(content: Option<String>) -> Self {
        let Some(raw) = content else {
            return ExtractionResult::Absent;
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(record)) => ExtractionResult::Parsed(record),
            Ok(_) | Err(_) => ExtractionResult::Malformed(raw),
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, ExtractionResult::Parsed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_response_is_parsed() {
        let result = ExtractionResult::from_response(Some(
            r#"{"ISIN": "XS1234567890", "Strike": [4229.53]}"#.to_string(),
        ));

        match result {
            ExtractionResult::Parsed(record) => {
                assert_eq!(record["ISIN"], "XS1234567890");
                assert_eq!(record.keys().collect::<Vec<_>>(), vec!["ISIN", "Strike"]);
            }
            other => panic!("expected Parsed, got {:?}", other),
        }
    }

    #[test]
    fn test_truncated_and_non_object_responses_are_malformed() {
        let truncated = r#"{"ISIN": "ABC""#.to_string();
        assert_eq!(
            ExtractionResult::from_response(Some(truncated.clone())),
            ExtractionResult::Malformed(truncated)
        );
        assert_eq!(
            ExtractionResult::from_response(Some("[1, 2]".to_string())),
            ExtractionResult::Malformed("[1, 2]".to_string())
        );
    }

    #[test]
    fn test_missing_content_is_absent() {
        assert_eq!(ExtractionResult::from_response(None), ExtractionResult::Absent);
    }

    #[test]
    fn test_request_serializes_generation_parameters() {
        let request = ChatCompletionRequest {
            model: "gpt-4-1106-preview",
            messages: vec![
                ChatMessage { role: "system", content: "prompt" },
                ChatMessage { role: "user", content: "text" },
            ],
            response_format: ResponseFormat::json_object(),
            temperature: 0.2,
            max_tokens: 4095,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["max_tokens"], 4095);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "text");
    }

    #[test]
    fn test_response_content_of_first_choice() {
        let response: ChatCompletionResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "{}"}, "finish_reason": "stop"}]}"#,
        )
        .unwrap();
        assert_eq!(response.into_content(), Some("{}".to_string()));

        let empty: ChatCompletionResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert_eq!(empty.into_content(), None);
    }
}
