use reqwest::{header, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};

use super::error::{ClientError, ClientResult};
use super::rest::RestClient;

#[derive(Debug, Deserialize)]
struct GraphQlEnvelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<GraphQlErrorEntry>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorEntry {
    message: String,
}

/// Posts queries to the BFF's `/api/graphql` with the session token.
#[derive(Debug, Clone)]
pub struct GraphQlClient {
    rest: RestClient,
}

impl GraphQlClient {
    pub fn new(rest: RestClient) -> Self {
        Self { rest }
    }

    pub async fn query<T: DeserializeOwned>(&self, query: &str, variables: Value) -> ClientResult<T> {
        let url = self.rest.url(&["api", "graphql"])?;
        let response = self
            .rest
            .authorize(self.rest.http().post(url))
            .header(header::ACCEPT, "application/json")
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("GraphQL request rejected, sign in again");
            return Err(ClientError::Unauthenticated);
        }
        if !status.is_success() {
            return Err(ClientError::from_response(response).await);
        }

        let bytes = response.bytes().await?;
        decode_envelope(&bytes)
    }
}

fn decode_envelope<T: DeserializeOwned>(bytes: &[u8]) -> ClientResult<T> {
    let envelope: GraphQlEnvelope = serde_json::from_slice(bytes)?;

    if let Some(errors) = envelope.errors.filter(|errors| !errors.is_empty()) {
        let messages: Vec<String> = errors.into_iter().map(|error| error.message).collect();
        return Err(ClientError::GraphQl(messages.join(", ")));
    }

    let data = envelope.data.ok_or(ClientError::EmptyBody)?;
    Ok(serde_json::from_value(data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_are_joined() {
        let body = br#"{"data":null,"errors":[{"message":"bad metric"},{"message":"no controller"}]}"#;
        let err = decode_envelope::<Value>(body).unwrap_err();
        assert!(matches!(&err, ClientError::GraphQl(messages) if messages == "bad metric, no controller"));
        assert_eq!(err.to_string(), "GraphQL errors: bad metric, no controller");
    }

    #[test]
    fn data_is_decoded() {
        let body = br#"{"data":{"getSupportedMetrics":["temperature"]}}"#;
        let data: Value = decode_envelope(body).unwrap();
        assert_eq!(data["getSupportedMetrics"][0], "temperature");
    }
}
