use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct QueryParam {
    pub name: String,
    pub value: String,
}

impl QueryParam {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetadata {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub query_string: Vec<QueryParam>,
}

impl RequestMetadata {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            query_string: Vec::new(),
        }
    }

    pub fn query_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_string.push(QueryParam::new(name, value));
        self
    }
}

/// A finished request paired with the body the host handed back for it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedExchange {
    pub method: String,
    pub url: String,
    pub query_string: Vec<QueryParam>,
    pub response: String,
}

impl CapturedExchange {
    pub fn from_request(request: RequestMetadata, response: impl Into<String>) -> Self {
        Self {
            method: request.method,
            url: request.url,
            query_string: request.query_string,
            response: response.into(),
        }
    }
}
