use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AggregateError;

/// Header name -> value. Names are compared case-insensitively when merged.
pub type Headers = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectionMode {
    Include,
    Exclude,
}

/// Field filter applied to a successful task result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionSpec {
    pub mode: ProjectionMode,
    pub fields: Vec<String>,
}

impl ProjectionSpec {
    pub fn include<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: ProjectionMode::Include,
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn exclude<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            mode: ProjectionMode::Exclude,
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// One declarative unit of proxied HTTP work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDescriptor {
    pub id: String,
    pub url: String,
    pub method: HttpMethod,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,

    /// Query parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,

    /// Request body. Older clients send it as `data`.
    #[serde(default, alias = "data", skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projection: Option<ProjectionSpec>,
}

impl TaskDescriptor {
    pub fn new(id: impl Into<String>, method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            method,
            headers: None,
            params: None,
            body: None,
            depends_on: Vec::new(),
            projection: None,
        }
    }

    pub fn get(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(id, HttpMethod::Get, url)
    }

    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = Some(params);
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(Headers::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_projection(mut self, projection: ProjectionSpec) -> Self {
        self.projection = Some(projection);
        self
    }
}

/// Common task interface for dependency graph handling.
pub trait TaskLike: Clone + Send + Sync {
    fn id(&self) -> &str;
    fn dependencies(&self) -> &[String];
}

impl TaskLike for TaskDescriptor {
    fn id(&self) -> &str {
        &self.id
    }

    fn dependencies(&self) -> &[String] {
        &self.depends_on
    }
}

/// A batch of tasks executed as one aggregate call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRequest {
    #[serde(default)]
    pub common_headers: Headers,

    pub items: Vec<TaskDescriptor>,

    /// When false, any task failure aborts the whole call.
    #[serde(default)]
    pub allow_partial: bool,
}

impl AggregateRequest {
    pub fn new(items: Vec<TaskDescriptor>) -> Self {
        Self {
            common_headers: Headers::new(),
            items,
            allow_partial: false,
        }
    }

    pub fn allow_partial(mut self, allow: bool) -> Self {
        self.allow_partial = allow;
        self
    }

    /// Wrap a single proxied task as a one-item strict batch.
    ///
    /// Dependencies are dropped: a lone task has nothing to wait for.
    pub fn single(mut task: TaskDescriptor) -> Self {
        task.depends_on.clear();
        Self::new(vec![task])
    }

    /// Structural checks that serde cannot express.
    pub fn validate(&self) -> Result<(), AggregateError> {
        let mut seen = HashSet::new();
        for (index, item) in self.items.iter().enumerate() {
            if item.id.trim().is_empty() {
                return Err(AggregateError::Validation(format!(
                    "items[{index}].id must not be empty"
                )));
            }
            if item.url.trim().is_empty() {
                return Err(AggregateError::Validation(format!(
                    "items[{index}] ({}) url must not be empty",
                    item.id
                )));
            }
            if !seen.insert(item.id.as_str()) {
                return Err(AggregateError::Validation(format!(
                    "duplicate task id: {}",
                    item.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_deserialize_camel_case() {
        let raw = json!({
            "id": "order",
            "url": "/o",
            "method": "POST",
            "dependsOn": ["user"],
            "data": {"uid": "$user.id"},
            "projection": {"mode": "exclude", "fields": ["secret"]}
        });
        let task: TaskDescriptor = serde_json::from_value(raw).unwrap();
        assert_eq!(task.method, HttpMethod::Post);
        assert_eq!(task.depends_on, vec!["user".to_string()]);
        assert_eq!(task.body, Some(json!({"uid": "$user.id"})));
        assert_eq!(task.projection, Some(ProjectionSpec::exclude(["secret"])));
    }

    #[test]
    fn test_bad_method_is_rejected() {
        let raw = json!({"id": "a", "url": "/a", "method": "TRACE"});
        assert!(serde_json::from_value::<TaskDescriptor>(raw).is_err());
    }

    #[test]
    fn test_missing_url_is_rejected() {
        let raw = json!({"id": "a", "method": "GET"});
        assert!(serde_json::from_value::<TaskDescriptor>(raw).is_err());
    }

    #[test]
    fn test_request_defaults() {
        let req: AggregateRequest = serde_json::from_value(json!({
            "items": [{"id": "a", "url": "/a", "method": "GET"}]
        }))
        .unwrap();
        assert!(!req.allow_partial);
        assert!(req.common_headers.is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicates_and_blanks() {
        let dup = AggregateRequest::new(vec![TaskDescriptor::get("a", "/a"), TaskDescriptor::get("a", "/b")]);
        assert!(matches!(dup.validate(), Err(AggregateError::Validation(msg)) if msg.contains("duplicate")));

        let blank = AggregateRequest::new(vec![TaskDescriptor::get(" ", "/a")]);
        assert!(blank.validate().is_err());

        let no_url = AggregateRequest::new(vec![TaskDescriptor::get("a", "")]);
        assert!(no_url.validate().is_err());
    }

    #[test]
    fn test_single_drops_dependencies() {
        let req = AggregateRequest::single(TaskDescriptor::get("a", "/a").depends_on(["ghost"]));
        assert!(req.items[0].depends_on.is_empty());
        assert!(!req.allow_partial);
    }
}
