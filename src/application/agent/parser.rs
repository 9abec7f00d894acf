use super::directive::ModelIntent;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct IntentError(pub String);

/// Parses a model reply into a typed intent. Code fences are stripped as
/// framing noise; beyond that the reply must deserialize into the intent
/// schema exactly.
pub fn parse_intent(content: &str) -> Result<ModelIntent, IntentError> {
    let candidate = strip_code_fence(content.trim());
    serde_json::from_str::<ModelIntent>(candidate.trim())
        .map_err(|err| IntentError(format!("reply is not a valid intent object: {err}")))
}

fn strip_code_fence(content: &str) -> &str {
    if let Some(rest) = content.strip_prefix("```") {
        let rest = rest
            .strip_prefix("json")
            .or_else(|| rest.strip_prefix("JSON"))
            .unwrap_or(rest);
        if let Some(end) = rest.rfind("```") {
            return &rest[..end];
        }
    }
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tool_call_intent() {
        let intent = parse_intent(
            r#"{"intent":"call_tool","tool_name":"add_person","arguments":{"name":"Jane","age":32,"profession":"data scientist"}}"#,
        )
        .expect("valid intent");
        match intent {
            ModelIntent::CallTool {
                tool_name,
                arguments,
            } => {
                assert_eq!(tool_name, "add_person");
                assert_eq!(arguments["age"], 32);
            }
            other => panic!("unexpected intent: {other:?}"),
        }
    }

    #[test]
    fn parses_final_answer_intent() {
        let intent = parse_intent(r#"{"intent":"final_answer","text":"done"}"#).expect("valid");
        match intent {
            ModelIntent::FinalAnswer { text } => assert_eq!(text, "done"),
            other => panic!("unexpected intent: {other:?}"),
        }
    }

    #[test]
    fn arguments_default_to_empty() {
        let intent =
            parse_intent(r#"{"intent":"call_tool","tool_name":"get_table_info"}"#).expect("valid");
        match intent {
            ModelIntent::CallTool { arguments, .. } => assert!(arguments.is_empty()),
            other => panic!("unexpected intent: {other:?}"),
        }
    }

    #[test]
    fn strips_code_fences() {
        let intent = parse_intent("```json\n{\"intent\":\"final_answer\",\"text\":\"ok\"}\n```")
            .expect("fenced reply");
        assert!(matches!(intent, ModelIntent::FinalAnswer { .. }));
    }

    #[test]
    fn rejects_free_text() {
        assert!(parse_intent("Sure! I will add Jane for you.").is_err());
    }

    #[test]
    fn rejects_unknown_intent_value() {
        assert!(parse_intent(r#"{"intent":"shrug"}"#).is_err());
    }

    #[test]
    fn rejects_tool_call_without_name() {
        assert!(parse_intent(r#"{"intent":"call_tool","arguments":{}}"#).is_err());
    }
}
