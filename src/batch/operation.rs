//! Queued logical call and its wire form.

use crate::error::ErrorContext;
use crate::types::CallResult;
use crate::{Error, Result};
use bytes::Bytes;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Arguments of one call. Strings are sent verbatim, everything else as JSON text.
pub type Args = BTreeMap<String, serde_json::Value>;

/// Caller-supplied transform applied to a call's result before it is placed in the output.
pub type PostProcess = Arc<dyn Fn(CallResult) -> CallResult + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpVerb {
    #[default]
    Get,
    Post,
    Put,
    Delete,
}

impl HttpVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::Get => "get",
            HttpVerb::Post => "post",
            HttpVerb::Put => "put",
            HttpVerb::Delete => "delete",
        }
    }

    /// GET and DELETE carry their args in the relative url, the rest in the body.
    pub fn args_in_url(&self) -> bool {
        matches!(self, HttpVerb::Get | HttpVerb::Delete)
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpVerb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(HttpVerb::Get),
            "post" => Ok(HttpVerb::Post),
            "put" => Ok(HttpVerb::Put),
            "delete" => Ok(HttpVerb::Delete),
            other => Err(Error::validation_with_context(
                format!("unsupported HTTP verb '{}'", other),
                ErrorContext::new().with_field_path("operation.verb"),
            )),
        }
    }
}

/// Which facet of a call's response ends up in the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpComponent {
    #[default]
    Body,
    Status,
    Headers,
}

/// Per-call (and per-execute) HTTP options.
#[derive(Clone, Default)]
pub struct HttpOptions {
    pub http_component: HttpComponent,
    /// Overrides the context credential for this call only.
    pub access_token: Option<String>,
    /// Batch dependency name, referenced by other calls' `depends_on`.
    pub name: Option<String>,
    pub depends_on: Option<String>,
    pub omit_response_on_success: Option<bool>,
    /// Timeout of the outer wire call; only meaningful on `execute`.
    pub timeout: Option<Duration>,
}

impl HttpOptions {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_component(mut self, c: HttpComponent) -> Self {
        self.http_component = c;
        self
    }
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
    pub fn with_depends_on(mut self, name: impl Into<String>) -> Self {
        self.depends_on = Some(name.into());
        self
    }
    pub fn with_omit_response_on_success(mut self, omit: bool) -> Self {
        self.omit_response_on_success = Some(omit);
        self
    }
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl fmt::Debug for HttpOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpOptions")
            .field("http_component", &self.http_component)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "<redacted>"),
            )
            .field("name", &self.name)
            .field("depends_on", &self.depends_on)
            .field("omit_response_on_success", &self.omit_response_on_success)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// One queued logical call.
///
/// Immutable once built; the queue owns it until a chunk takes it for dispatch.
#[derive(Clone)]
pub struct BatchOperation {
    path: String,
    args: Args,
    verb: HttpVerb,
    credential: String,
    http_options: HttpOptions,
    post_process: Option<PostProcess>,
    files: Option<BTreeMap<String, Bytes>>,
}

impl BatchOperation {
    pub fn new(path: impl Into<String>, verb: HttpVerb, credential: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            args: Args::new(),
            verb,
            credential: credential.into(),
            http_options: HttpOptions::default(),
            post_process: None,
            files: None,
        }
    }

    pub fn with_args(mut self, args: Args) -> Self {
        self.args = args;
        self
    }

    pub fn with_options(mut self, options: HttpOptions) -> Self {
        self.http_options = options;
        self
    }

    pub fn with_post_process(mut self, f: PostProcess) -> Self {
        self.post_process = Some(f);
        self
    }

    /// Attach a file part. `key` must be unique across the whole batch.
    pub fn with_file(mut self, key: impl Into<String>, data: impl Into<Bytes>) -> Self {
        self.files
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), data.into());
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }
    pub fn args(&self) -> &Args {
        &self.args
    }
    pub fn verb(&self) -> HttpVerb {
        self.verb
    }
    pub fn credential(&self) -> &str {
        &self.credential
    }
    pub fn http_options(&self) -> &HttpOptions {
        &self.http_options
    }
    pub fn post_process(&self) -> Option<&PostProcess> {
        self.post_process.as_ref()
    }
    pub fn files(&self) -> Option<&BTreeMap<String, Bytes>> {
        self.files.as_ref()
    }

    /// Wire form of this call inside the `batch` array.
    ///
    /// `main_credential` is the token of the outer request; a differing
    /// per-call credential travels as an `access_token` arg.
    pub fn to_batch_params(&self, main_credential: &str) -> serde_json::Value {
        let mut args = self.args.clone();
        if self.credential != main_credential {
            args.insert(
                "access_token".to_string(),
                serde_json::Value::String(self.credential.clone()),
            );
        }
        let encoded = encode_args(&args);

        let mut relative_url = self.path.trim_start_matches('/').to_string();
        let mut body = None;
        if !encoded.is_empty() {
            if self.verb.args_in_url() {
                relative_url.push(if relative_url.contains('?') { '&' } else { '?' });
                relative_url.push_str(&encoded);
            } else {
                body = Some(encoded);
            }
        }

        let params = BatchParams {
            method: self.verb,
            relative_url,
            body,
            attached_files: self
                .files
                .as_ref()
                .map(|f| f.keys().cloned().collect::<Vec<_>>().join(",")),
            name: self.http_options.name.clone(),
            depends_on: self.http_options.depends_on.clone(),
            omit_response_on_success: self.http_options.omit_response_on_success,
        };
        // Infallible: every field is a plain string/bool.
        serde_json::to_value(params).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Debug for BatchOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchOperation")
            .field("path", &self.path)
            .field("verb", &self.verb)
            .field("args", &self.args)
            .field("http_options", &self.http_options)
            .field("post_process", &self.post_process.as_ref().map(|_| "<fn>"))
            .field(
                "files",
                &self.files.as_ref().map(|f| f.keys().collect::<Vec<_>>()),
            )
            .finish()
    }
}

#[derive(Serialize)]
struct BatchParams {
    method: HttpVerb,
    relative_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attached_files: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    depends_on: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    omit_response_on_success: Option<bool>,
}

/// Form-encodes args; `null` values are dropped.
pub(crate) fn encode_args(args: &Args) -> String {
    let mut ser = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in args {
        match v {
            serde_json::Value::Null => {}
            serde_json::Value::String(s) => {
                ser.append_pair(k, s);
            }
            other => {
                ser.append_pair(k, &other.to_string());
            }
        }
    }
    ser.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(pairs: &[(&str, serde_json::Value)]) -> Args {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_get_puts_args_in_relative_url() {
        let op = BatchOperation::new("/me/friends", HttpVerb::Get, "tok")
            .with_args(args(&[("limit", json!(5)), ("fields", json!("id,name"))]));
        let params = op.to_batch_params("tok");
        assert_eq!(params["method"], "get");
        assert_eq!(params["relative_url"], "me/friends?fields=id%2Cname&limit=5");
        assert!(params.get("body").is_none());
        assert!(params.get("attached_files").is_none());
    }

    #[test]
    fn test_get_appends_to_existing_query() {
        let op = BatchOperation::new("search?q=rust", HttpVerb::Get, "tok")
            .with_args(args(&[("type", json!("page"))]));
        assert_eq!(op.to_batch_params("tok")["relative_url"], "search?q=rust&type=page");
    }

    #[test]
    fn test_post_puts_args_in_body() {
        let op = BatchOperation::new("me/feed", HttpVerb::Post, "tok")
            .with_args(args(&[("message", json!("hello world"))]));
        let params = op.to_batch_params("tok");
        assert_eq!(params["method"], "post");
        assert_eq!(params["relative_url"], "me/feed");
        assert_eq!(params["body"], "message=hello+world");
    }

    #[test]
    fn test_foreign_credential_travels_as_arg() {
        let op = BatchOperation::new("me", HttpVerb::Get, "other");
        assert_eq!(op.to_batch_params("main")["relative_url"], "me?access_token=other");
        assert_eq!(op.to_batch_params("other")["relative_url"], "me");
    }

    #[test]
    fn test_attached_files_and_batch_args() {
        let op = BatchOperation::new("me/photos", HttpVerb::Post, "tok")
            .with_file("file_b", Bytes::from_static(b"b"))
            .with_file("file_a", Bytes::from_static(b"a"))
            .with_options(
                HttpOptions::new()
                    .with_name("upload")
                    .with_omit_response_on_success(false),
            );
        let params = op.to_batch_params("tok");
        assert_eq!(params["attached_files"], "file_a,file_b");
        assert_eq!(params["name"], "upload");
        assert_eq!(params["omit_response_on_success"], false);
        assert!(params.get("depends_on").is_none());
    }

    #[test]
    fn test_null_args_are_dropped() {
        let encoded = encode_args(&args(&[("a", json!(null)), ("b", json!(true))]));
        assert_eq!(encoded, "b=true");
    }

    #[test]
    fn test_verb_parsing() {
        assert_eq!("DELETE".parse::<HttpVerb>().unwrap(), HttpVerb::Delete);
        assert!("patch".parse::<HttpVerb>().is_err());
    }

    #[test]
    fn test_debug_hides_callback_and_credentials() {
        let op = BatchOperation::new("me", HttpVerb::Get, "main-secret")
            .with_options(HttpOptions::new().with_access_token("page-secret"))
            .with_post_process(Arc::new(|r: CallResult| r));
        let text = format!("{:?}", op);
        assert!(text.contains("<fn>"));
        assert!(text.contains("<redacted>"));
        assert!(!text.contains("main-secret"));
        assert!(!text.contains("page-secret"));
    }

    #[test]
    fn test_http_options_debug_without_token() {
        let text = format!("{:?}", HttpOptions::new().with_name("first"));
        assert!(text.contains("access_token: None"));
        assert!(text.contains("\"first\""));
    }
}
