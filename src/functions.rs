//! Callable backend functions.
//!
//! A [`FunctionsClient`] speaks JSON; [`function_callable`] puts typed,
//! serde-encoded requests and responses on top of it and wraps the result in a
//! [`Callable`]. [`function_streamer`] does the same for functions that stream
//! partial results before their final response.

use std::{fmt, sync::Arc, time::Duration};

use futures::{
    FutureExt, StreamExt,
    future::BoxFuture,
    stream::BoxStream,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    callable::Callable,
    errors::{BackendError, BackendResult},
};

/// Which function to call: a deployed name or a full URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FunctionTarget {
    Name(String),
    Url(String),
}

impl FunctionTarget {
    /// `http://` and `https://` prefixes select URL mode.
    pub fn parse(name_or_url: &str) -> BackendResult<Self> {
        let trimmed = name_or_url.trim();
        if trimmed.is_empty() {
            return Err(BackendError::InvalidReference(
                "function name or url is empty".to_string(),
            ));
        }
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            Ok(Self::Url(trimmed.to_string()))
        } else {
            Ok(Self::Name(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FunctionTarget::Name(name) => name,
            FunctionTarget::Url(url) => url,
        }
    }
}

impl fmt::Display for FunctionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-call options forwarded to the client
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CallOptions {
    /// Client-side timeout; `None` leaves it to the client's default
    pub timeout: Option<Duration>,
    pub limited_use_app_check_tokens: bool,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_limited_use_app_check_tokens(mut self) -> Self {
        self.limited_use_app_check_tokens = true;
        self
    }
}

/// An open streaming call
pub struct StreamingResponse {
    /// Partial results in arrival order
    pub chunks: BoxStream<'static, BackendResult<serde_json::Value>>,
    /// Final response, available once the stream has ended
    pub data: BoxFuture<'static, BackendResult<serde_json::Value>>,
}

impl fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingResponse").finish_non_exhaustive()
    }
}

/// Transport for callable functions
pub trait FunctionsClient: Send + Sync + 'static {
    fn call(
        &self,
        target: &FunctionTarget,
        payload: serde_json::Value,
        options: &CallOptions,
    ) -> BoxFuture<'static, BackendResult<serde_json::Value>>;

    /// Call in streaming mode.
    ///
    /// Dropping the response (or the future) aborts the call. The default
    /// fails with [`BackendError::Operation`].
    fn stream(
        &self,
        target: &FunctionTarget,
        payload: serde_json::Value,
        options: &CallOptions,
    ) -> BoxFuture<'static, BackendResult<StreamingResponse>> {
        let _ = (payload, options);
        let message = format!("function {target} does not support streaming");
        async move { Err(BackendError::Operation(message)) }.boxed()
    }
}

/// Receives each decoded chunk of a streaming call
pub type ChunkObserver<Chunk> = Arc<dyn Fn(Chunk) + Send + Sync>;

/// Build a typed [`Callable`] for a backend function.
///
/// Fails immediately if `name_or_url` is malformed. Encoding or decoding
/// failures surface as [`BackendError::Operation`] in the callable's state.
pub fn function_callable<C, Req, Resp>(
    client: Arc<C>,
    name_or_url: &str,
    options: CallOptions,
) -> BackendResult<Callable<Req, Resp>>
where
    C: FunctionsClient,
    Req: Serialize + Send + 'static,
    Resp: DeserializeOwned + Send + Sync + 'static,
{
    let target = FunctionTarget::parse(name_or_url)?;
    crate::debug_log!("📞 [FUNCTION] prepared callable for {}", target);
    Ok(Callable::new(move |request: Req| {
        let encoded = serde_json::to_value(&request);
        let call = encoded.map(|payload| client.call(&target, payload, &options));
        async move {
            let response = call?.await?;
            Ok::<Resp, BackendError>(serde_json::from_value(response)?)
        }
    }))
}

/// Build a typed [`Callable`] for a streaming backend function.
///
/// Every chunk is decoded and handed to `on_chunk` as it arrives; the
/// invocation then resolves with the final response. Without an observer the
/// chunk stream is dropped unread and only the final response is awaited.
/// Superseding or dropping the callable aborts the stream.
pub fn function_streamer<C, Req, Resp, Chunk>(
    client: Arc<C>,
    name_or_url: &str,
    options: CallOptions,
    on_chunk: Option<ChunkObserver<Chunk>>,
) -> BackendResult<Callable<Req, Resp>>
where
    C: FunctionsClient,
    Req: Serialize + Send + 'static,
    Resp: DeserializeOwned + Send + Sync + 'static,
    Chunk: DeserializeOwned + Send + 'static,
{
    let target = FunctionTarget::parse(name_or_url)?;
    crate::debug_log!("📞 [FUNCTION] prepared streaming callable for {}", target);
    Ok(Callable::new(move |request: Req| {
        let encoded = serde_json::to_value(&request);
        let opened = encoded.map(|payload| client.stream(&target, payload, &options));
        let on_chunk = on_chunk.clone();
        async move {
            let StreamingResponse { mut chunks, data } = opened?.await?;
            match on_chunk {
                Some(observer) => {
                    while let Some(chunk) = chunks.next().await {
                        observer(serde_json::from_value::<Chunk>(chunk?)?);
                    }
                }
                None => drop(chunks),
            }
            Ok::<Resp, BackendError>(serde_json::from_value(data.await?)?)
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use serde_json::{Value, json};
    use std::sync::Mutex;

    /// Streams each character of the `text` field, then its length
    struct Spelling;

    impl FunctionsClient for Spelling {
        fn call(&self, _: &FunctionTarget, _: Value, _: &CallOptions) -> BoxFuture<'static, BackendResult<Value>> {
            async { Ok(Value::Null) }.boxed()
        }

        fn stream(
            &self,
            _: &FunctionTarget,
            payload: Value,
            _: &CallOptions,
        ) -> BoxFuture<'static, BackendResult<StreamingResponse>> {
            let text = payload["text"].as_str().unwrap_or_default().to_string();
            let chunks: Vec<BackendResult<Value>> = text.chars().map(|c| Ok(json!(c.to_string()))).collect();
            let length = text.chars().count();
            async move {
                Ok(StreamingResponse {
                    chunks: stream::iter(chunks).boxed(),
                    data: async move { Ok(json!(length)) }.boxed(),
                })
            }
            .boxed()
        }
    }

    /// Only supports plain calls
    struct PlainOnly;

    impl FunctionsClient for PlainOnly {
        fn call(&self, _: &FunctionTarget, payload: Value, _: &CallOptions) -> BoxFuture<'static, BackendResult<Value>> {
            async move { Ok(payload) }.boxed()
        }
    }

    #[test]
    fn target_mode_follows_scheme() {
        assert_eq!(
            FunctionTarget::parse("addMessage").unwrap(),
            FunctionTarget::Name("addMessage".to_string())
        );
        assert_eq!(
            FunctionTarget::parse("https://example.com/fn").unwrap(),
            FunctionTarget::Url("https://example.com/fn".to_string())
        );
        assert!(matches!(
            FunctionTarget::parse("  "),
            Err(BackendError::InvalidReference(_))
        ));
    }

    #[test]
    fn call_options_deserialize_with_defaults() {
        let options: CallOptions =
            serde_json::from_str(r#"{"limitedUseAppCheckTokens": true}"#).unwrap();
        assert_eq!(
            options,
            CallOptions::new().with_limited_use_app_check_tokens()
        );
    }

    #[tokio::test]
    async fn streamer_forwards_chunks_then_resolves() {
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));
        let sink = seen.clone();
        let observer: ChunkObserver<String> = Arc::new(move |chunk: String| sink.lock().unwrap().push(chunk));
        let spell = function_streamer::<_, Value, usize, String>(
            Arc::new(Spelling),
            "spell",
            CallOptions::default(),
            Some(observer),
        )
        .unwrap();

        spell.invoke(json!({ "text": "abc" })).await;

        assert_eq!(*seen.lock().unwrap(), vec!["a", "b", "c"]);
        assert_eq!(spell.result().as_deref(), Some(&3));
    }

    #[tokio::test]
    async fn streamer_without_observer_only_awaits_final_data() {
        let spell =
            function_streamer::<_, Value, usize, Value>(Arc::new(Spelling), "spell", CallOptions::default(), None)
                .unwrap();

        spell.invoke(json!({ "text": "hello" })).await;

        assert_eq!(spell.result().as_deref(), Some(&5));
        assert_eq!(spell.error(), None);
    }

    #[tokio::test]
    async fn streaming_is_unsupported_by_default() {
        let echo =
            function_streamer::<_, Value, Value, Value>(Arc::new(PlainOnly), "echo", CallOptions::default(), None)
                .unwrap();

        echo.invoke(json!(1)).await;

        assert!(matches!(echo.error(), Some(BackendError::Operation(message)) if message.contains("echo")));
    }
}
