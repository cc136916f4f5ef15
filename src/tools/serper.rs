//! Google search through the Serper API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::Tool;

pub const SERPER_SEARCH_URL: &str = "https://google.serper.dev/search";
pub const SERPER_TOOL_NAME: &str = "serper_search";

const DEFAULT_RESULTS: u64 = 5;
const MAX_RESULTS: u64 = 10;

pub struct SerperDevTool {
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

impl SerperDevTool {
    pub fn new(api_key: impl Into<String>) -> anyhow::Result<Self> {
        Self::with_endpoint(api_key, SERPER_SEARCH_URL)
    }

    pub fn with_endpoint(api_key: impl Into<String>, endpoint: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            client,
        })
    }
}

#[derive(Debug, Serialize)]
struct SerperRequest<'a> {
    q: &'a str,
    num: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SerperResponse {
    #[serde(default)]
    answer_box: Option<AnswerBox>,
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct AnswerBox {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
}

#[async_trait]
impl Tool for SerperDevTool {
    fn name(&self) -> &str {
        SERPER_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Search the internet with Google. Returns titles, links and snippets for the top results. Use it to find recent developments, articles and reports."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "num_results": {
                    "type": "integer",
                    "description": "Maximum number of results to return (default: 5, max: 10)"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<String> {
        let query = args["query"]
            .as_str()
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| anyhow::anyhow!("Missing 'query' argument"))?;
        let num = args["num_results"]
            .as_u64()
            .unwrap_or(DEFAULT_RESULTS)
            .clamp(1, MAX_RESULTS);

        tracing::debug!(query, num, "Serper search");

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&SerperRequest { q: query, num })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Serper API error ({}): {}", status, error_text);
        }

        let parsed: SerperResponse = response.json().await?;
        Ok(format_results(query, &parsed, num as usize))
    }
}

fn format_results(query: &str, response: &SerperResponse, limit: usize) -> String {
    let answer = response
        .answer_box
        .as_ref()
        .and_then(|b| b.answer.as_deref().or(b.snippet.as_deref()))
        .filter(|a| !a.is_empty());

    if response.organic.is_empty() && answer.is_none() {
        return format!("No results found for: {}", query);
    }

    let mut output = String::new();
    if let Some(answer) = answer {
        output.push_str("## Answer\n\n");
        output.push_str(answer);
        output.push_str("\n\n");
        if !response.organic.is_empty() {
            output.push_str("## Results\n\n");
        }
    }

    for (i, result) in response.organic.iter().take(limit).enumerate() {
        output.push_str(&format!(
            "### {}. {}\nLink: {}\n{}\n\n",
            i + 1,
            result.title,
            result.link,
            result.snippet
        ));
    }

    output.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> SerperResponse {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn formats_organic_results_in_order() {
        let response = parse(
            r#"{"organic": [
                {"title": "First", "link": "https://a.example", "snippet": "alpha"},
                {"title": "Second", "link": "https://b.example", "snippet": "beta"}
            ]}"#,
        );
        let text = format_results("llm", &response, 5);
        assert!(text.starts_with("### 1. First\nLink: https://a.example\nalpha"));
        assert!(text.contains("### 2. Second"));
        assert!(!text.contains("## Answer"));
    }

    #[test]
    fn answer_box_is_listed_first() {
        let response = parse(
            r#"{"answerBox": {"answer": "42"},
                "organic": [{"title": "T", "link": "https://t.example"}]}"#,
        );
        let text = format_results("meaning", &response, 5);
        assert!(text.starts_with("## Answer\n\n42"));
        assert!(text.contains("### 1. T"));
    }

    #[test]
    fn answer_box_alone_has_no_results_section() {
        let response = parse(r#"{"answerBox": {"snippet": "Paris"}}"#);
        let text = format_results("capital of france", &response, 5);
        assert_eq!(text, "## Answer\n\nParis");
    }

    #[test]
    fn limit_caps_listed_results() {
        let response = parse(
            r#"{"organic": [
                {"title": "A", "link": "l"}, {"title": "B", "link": "l"}, {"title": "C", "link": "l"}
            ]}"#,
        );
        let text = format_results("q", &response, 2);
        assert!(text.contains("### 2. B"));
        assert!(!text.contains("### 3. C"));
    }

    #[test]
    fn empty_response_reports_no_results() {
        let text = format_results("nothing", &SerperResponse::default(), 5);
        assert_eq!(text, "No results found for: nothing");
    }

    #[tokio::test]
    async fn missing_query_is_rejected() {
        let tool = SerperDevTool::new("key").unwrap();
        let err = tool.execute(json!({"num_results": 3})).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing 'query' argument");
        let err = tool.execute(json!({"query": "  "})).await.unwrap_err();
        assert_eq!(err.to_string(), "Missing 'query' argument");
    }
}
