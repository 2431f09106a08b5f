//! HTTP client for the to-do application

use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;

/// JSON shape returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct TodoItem {
    pub id: u64,
    pub task: String,
    pub done: bool,
    pub status: String,
    #[serde(default)]
    pub assignee: Option<String>,
}

/// Thin wrapper around `reqwest` that knows the application's routes.
#[derive(Debug, Clone)]
pub struct TodoClient {
    client: Client,
    base_url: String,
}

impl TodoClient {
    pub fn new(base_url: &str) -> Self {
        // Redirects are asserted explicitly by the UI suite
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn list(&self) -> reqwest::Result<Vec<TodoItem>> {
        self.client.get(self.url("/todos")).send().await?.json().await
    }

    pub async fn create_raw(&self, body: serde_json::Value) -> reqwest::Result<Response> {
        self.client.post(self.url("/todos")).json(&body).send().await
    }

    pub async fn create(&self, task: &str) -> reqwest::Result<TodoItem> {
        self.create_raw(json!({ "task": task })).await?.json().await
    }

    pub async fn update(&self, id: u64, body: serde_json::Value) -> reqwest::Result<Response> {
        self.client
            .put(self.url(&format!("/todos/{}", id)))
            .json(&body)
            .send()
            .await
    }

    pub async fn delete(&self, id: u64) -> reqwest::Result<Response> {
        self.client
            .delete(self.url(&format!("/todos/{}", id)))
            .send()
            .await
    }

    /// Delete every item through the API.
    pub async fn delete_all(&self) -> reqwest::Result<()> {
        for todo in self.list().await? {
            self.delete(todo.id).await?;
        }
        Ok(())
    }

    pub async fn reset(&self) -> reqwest::Result<StatusCode> {
        Ok(self.client.post(self.url("/reset-db")).send().await?.status())
    }

    /// `GET /` as text.
    pub async fn page(&self) -> reqwest::Result<String> {
        self.client.get(self.url("/")).send().await?.text().await
    }

    /// Submit a form the way a browser would.
    pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> reqwest::Result<Response> {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", encode_form_value(k), encode_form_value(v)))
            .collect::<Vec<_>>()
            .join("&");

        self.client
            .post(self.url(path))
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(body)
            .send()
            .await
    }

    pub async fn add_via_form(&self, task: &str) -> reqwest::Result<Response> {
        self.post_form("/", &[("task", task)]).await
    }
}

fn encode_form_value(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'*' => {
                encoded.push(byte as char)
            }
            b' ' => encoded.push('+'),
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_form_value() {
        assert_eq!(encode_form_value("Buy groceries"), "Buy+groceries");
        assert_eq!(encode_form_value("a&b=c"), "a%26b%3Dc");
    }
}
