//! Server-side handler table: the `initialize`/`ping`/`tools/*`/`prompts/*`/
//! `resources/*`/`logging/*` surface, consulting the embedder-supplied
//! provider trait objects.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::dispatcher::{HandlerError, HandlerTable};
use crate::protocol::constants::methods;
use crate::protocol::errors::McpError;
use crate::protocol::types::{
    CallToolRequest, CallToolResult, Content, GetPromptRequest, GetPromptResult,
    InitializeRequest, InitializeResponse, ListPromptsRequest, ListPromptsResult,
    ListResourceTemplatesResponse, ListResourcesRequest, ListResourcesResult, ListToolsRequest,
    ListToolsResult, LoggingCapabilities, PromptCapabilities, ReadResourceRequest,
    ReadResourceResult, ResourceCapabilities, ServerCapabilities, ServerInfo, SetLoggingRequest,
    SubscribeResourceRequest, ToolCapabilities, UnsubscribeResourceRequest,
};
use crate::providers::{LoggingHandler, PromptProvider, ResourceProvider, ToolProvider};
use crate::session::{PeerImplementation, Session};

fn decode<T: serde::de::DeserializeOwned>(params: Option<Value>, what: &str) -> Result<T, HandlerError> {
    // An absent `params` is not the same as a JSON `null` payload: callers with
    // no arguments at all (bare `tools/list`, `ping`-shaped requests) send no
    // `params` key, and that should decode the same as `{}` would for a struct
    // made entirely of optional fields, not fail the way a literal `null` does.
    serde_json::from_value(params.unwrap_or_else(|| Value::Object(Default::default())))
        .map_err(|e| HandlerError::InvalidParams(format!("invalid {what}: {e}")))
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, HandlerError> {
    serde_json::to_value(value).map_err(|e| HandlerError::Internal(e.to_string()))
}

fn mcp(err: McpError) -> HandlerError {
    HandlerError::Mcp(err)
}

/// Page size for every paginated `*/list` method. Providers here return their
/// full in-memory collection up front; pagination is applied at this layer
/// rather than threaded into the provider traits.
const LIST_PAGE_SIZE: usize = 50;

/// Slice `items` starting at `cursor` (an opaque stringified offset), and
/// return the next page's cursor if more items remain.
fn paginate<T>(mut items: Vec<T>, cursor: Option<String>) -> Result<(Vec<T>, Option<String>), HandlerError> {
    let offset = match cursor {
        None => 0,
        Some(cursor) => cursor
            .parse::<usize>()
            .map_err(|_| HandlerError::InvalidParams(format!("invalid cursor: {cursor}")))?,
    };

    let mut page = items.split_off(offset.min(items.len()));
    let next_cursor = if page.len() > LIST_PAGE_SIZE {
        page.split_off(LIST_PAGE_SIZE);
        Some((offset + LIST_PAGE_SIZE).to_string())
    } else {
        None
    };
    Ok((page, next_cursor))
}

/// Table of method handlers for the server role.
///
/// Every provider slot is optional: a server only advertises the
/// corresponding capability (and answers its methods) when a provider was
/// supplied at construction, per the `ClientCapabilities`/`ServerCapabilities`
/// negotiation in `initialize`.
pub struct ServerHandlerTable {
    server_info: ServerInfo,
    instructions: Option<String>,
    resources: Option<Arc<dyn ResourceProvider>>,
    tools: Option<Arc<dyn ToolProvider>>,
    prompts: Option<Arc<dyn PromptProvider>>,
    logging: Option<Arc<dyn LoggingHandler>>,
}

impl ServerHandlerTable {
    pub fn new(server_info: ServerInfo, instructions: Option<String>) -> Self {
        Self {
            server_info,
            instructions,
            resources: None,
            tools: None,
            prompts: None,
            logging: None,
        }
    }

    pub fn with_resource_provider(mut self, provider: Arc<dyn ResourceProvider>) -> Self {
        self.resources = Some(provider);
        self
    }

    pub fn with_tool_provider(mut self, provider: Arc<dyn ToolProvider>) -> Self {
        self.tools = Some(provider);
        self
    }

    pub fn with_prompt_provider(mut self, provider: Arc<dyn PromptProvider>) -> Self {
        self.prompts = Some(provider);
        self
    }

    pub fn with_logging_handler(mut self, handler: Arc<dyn LoggingHandler>) -> Self {
        self.logging = Some(handler);
        self
    }

    fn capabilities(&self) -> ServerCapabilities {
        ServerCapabilities {
            experimental: None,
            logging: self.logging.as_ref().map(|_| LoggingCapabilities {}),
            prompts: self.prompts.as_ref().map(|_| PromptCapabilities::default()),
            resources: self.resources.as_ref().map(|_| ResourceCapabilities::default()),
            tools: self.tools.as_ref().map(|_| ToolCapabilities::default()),
        }
    }

    async fn handle_initialize(&self, session: &Arc<Session>, params: Option<Value>) -> Result<Value, HandlerError> {
        let request: InitializeRequest = decode(params, "initialize params")?;
        session.set_protocol_version(request.protocol_version.clone()).await;
        session
            .set_peer_info(
                PeerImplementation {
                    name: request.client_info.name.clone(),
                    version: request.client_info.version.clone(),
                },
                request.capabilities.clone(),
            )
            .await;

        let capabilities = to_value(self.capabilities())?;
        let response = InitializeResponse::new(capabilities, self.server_info.clone(), self.instructions.clone());
        to_value(response)
    }

    async fn handle_tools_list(&self, params: Option<Value>) -> Result<Value, HandlerError> {
        let provider = self
            .tools
            .as_ref()
            .ok_or_else(|| mcp(McpError::unsupported_capability("tools")))?;
        let request: ListToolsRequest = decode(params, "tools/list params")?;
        let tools = provider.list_tools().await.map_err(mcp)?;
        let (page, next_cursor) = paginate(tools, request.cursor)?;
        to_value(ListToolsResult::with_cursor(page, next_cursor))
    }

    async fn handle_tools_call(&self, params: Option<Value>) -> Result<Value, HandlerError> {
        let provider = self
            .tools
            .as_ref()
            .ok_or_else(|| mcp(McpError::unsupported_capability("tools")))?;
        let request: CallToolRequest = decode(params, "tools/call params")?;
        match provider.call_tool(&request.name, request.arguments).await {
            Ok(content) => to_value(CallToolResult::success(content)),
            // Tool execution failures (including an unknown tool name) surface as a
            // result with `isError: true` rather than a protocol-level error, so a
            // client can render the failure as part of the conversation.
            Err(err) => to_value(CallToolResult::error(vec![Content::text(err.to_string())])),
        }
    }

    async fn handle_prompts_list(&self, params: Option<Value>) -> Result<Value, HandlerError> {
        let provider = self
            .prompts
            .as_ref()
            .ok_or_else(|| mcp(McpError::unsupported_capability("prompts")))?;
        let request: ListPromptsRequest = decode(params, "prompts/list params")?;
        let prompts = provider.list_prompts().await.map_err(mcp)?;
        let (page, next_cursor) = paginate(prompts, request.cursor)?;
        to_value(ListPromptsResult::with_cursor(page, next_cursor))
    }

    async fn handle_prompts_get(&self, params: Option<Value>) -> Result<Value, HandlerError> {
        let provider = self
            .prompts
            .as_ref()
            .ok_or_else(|| mcp(McpError::unsupported_capability("prompts")))?;
        let request: GetPromptRequest = decode(params, "prompts/get params")?;
        let (description, messages) = provider
            .get_prompt(&request.name, request.arguments)
            .await
            .map_err(mcp)?;
        to_value(GetPromptResult::new(Some(description), messages))
    }

    async fn handle_resources_list(&self, params: Option<Value>) -> Result<Value, HandlerError> {
        let provider = self
            .resources
            .as_ref()
            .ok_or_else(|| mcp(McpError::unsupported_capability("resources")))?;
        let request: ListResourcesRequest = decode(params, "resources/list params")?;
        let resources = provider.list_resources().await.map_err(mcp)?;
        let (page, next_cursor) = paginate(resources, request.cursor)?;
        to_value(ListResourcesResult::with_cursor(page, next_cursor))
    }

    async fn handle_resources_templates_list(&self) -> Result<Value, HandlerError> {
        self.resources
            .as_ref()
            .ok_or_else(|| mcp(McpError::unsupported_capability("resources")))?;
        to_value(ListResourceTemplatesResponse {
            resource_templates: Vec::new(),
            next_cursor: None,
        })
    }

    async fn handle_resources_read(&self, params: Option<Value>) -> Result<Value, HandlerError> {
        let provider = self
            .resources
            .as_ref()
            .ok_or_else(|| mcp(McpError::unsupported_capability("resources")))?;
        let request: ReadResourceRequest = decode(params, "resources/read params")?;
        let contents = provider.read_resource(request.uri.as_str()).await.map_err(mcp)?;
        to_value(ReadResourceResult::new(contents))
    }

    async fn handle_resources_subscribe(
        &self,
        session: &Arc<Session>,
        params: Option<Value>,
    ) -> Result<Value, HandlerError> {
        let provider = self
            .resources
            .as_ref()
            .ok_or_else(|| mcp(McpError::unsupported_capability("resources")))?;
        let request: SubscribeResourceRequest = decode(params, "resources/subscribe params")?;
        provider
            .subscribe_to_resource(request.uri.as_str())
            .await
            .map_err(mcp)?;
        session.subscribe(request.uri.as_str().to_string());
        to_value(serde_json::json!({}))
    }

    async fn handle_resources_unsubscribe(
        &self,
        session: &Arc<Session>,
        params: Option<Value>,
    ) -> Result<Value, HandlerError> {
        let provider = self
            .resources
            .as_ref()
            .ok_or_else(|| mcp(McpError::unsupported_capability("resources")))?;
        let request: UnsubscribeResourceRequest = decode(params, "resources/unsubscribe params")?;
        provider
            .unsubscribe_from_resource(request.uri.as_str())
            .await
            .map_err(mcp)?;
        session.unsubscribe(request.uri.as_str());
        to_value(serde_json::json!({}))
    }

    async fn handle_logging_set_level(&self, params: Option<Value>) -> Result<Value, HandlerError> {
        let handler = self
            .logging
            .as_ref()
            .ok_or_else(|| mcp(McpError::unsupported_capability("logging")))?;
        let request: SetLoggingRequest = decode(params, "logging/setLevel params")?;
        let config = crate::protocol::types::LoggingConfig::new(request.level);
        let applied = handler.set_logging(config).await.map_err(mcp)?;
        to_value(serde_json::json!({"success": applied, "message": Option::<String>::None}))
    }
}

#[async_trait]
impl HandlerTable for ServerHandlerTable {
    async fn handle_request(
        &self,
        session: &Arc<Session>,
        method: &str,
        params: Option<Value>,
    ) -> Result<Value, HandlerError> {
        match method {
            methods::INITIALIZE => self.handle_initialize(session, params).await,
            methods::PING => Ok(Value::Object(Default::default())),
            methods::TOOLS_LIST => self.handle_tools_list(params).await,
            methods::TOOLS_CALL => self.handle_tools_call(params).await,
            methods::PROMPTS_LIST => self.handle_prompts_list(params).await,
            methods::PROMPTS_GET => self.handle_prompts_get(params).await,
            methods::RESOURCES_LIST => self.handle_resources_list(params).await,
            methods::RESOURCES_TEMPLATES_LIST => self.handle_resources_templates_list().await,
            methods::RESOURCES_READ => self.handle_resources_read(params).await,
            methods::RESOURCES_SUBSCRIBE => self.handle_resources_subscribe(session, params).await,
            methods::RESOURCES_UNSUBSCRIBE => self.handle_resources_unsubscribe(session, params).await,
            methods::LOGGING_SET_LEVEL => self.handle_logging_set_level(params).await,
            other => Err(HandlerError::MethodNotFound(other.to_string())),
        }
    }

    async fn handle_notification(&self, session: &Arc<Session>, method: &str, _params: Option<Value>) {
        debug!(session_id = session.id(), method, "unhandled server-side notification");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::JsonRpcMessage;
    use crate::protocol::transport::{SessionSink, TransportError};
    use crate::providers::MathToolProvider;
    use crate::session::SessionConfig;
    use serde_json::json;

    struct NullSink;

    #[async_trait]
    impl SessionSink for NullSink {
        async fn send(&self, _message: &JsonRpcMessage) -> Result<(), TransportError> {
            Ok(())
        }
    }

    async fn session() -> Arc<Session> {
        Arc::new(
            Session::new("s1", Arc::new(NullSink), SessionConfig::default())
                .await
                .unwrap(),
        )
    }

    fn table() -> ServerHandlerTable {
        ServerHandlerTable::new(
            ServerInfo {
                name: "test-server".to_string(),
                version: "0.1.0".to_string(),
            },
            None,
        )
        .with_tool_provider(Arc::new(MathToolProvider::new()))
    }

    #[tokio::test]
    async fn initialize_reports_only_configured_capabilities() {
        let table = table();
        let session = session().await;
        let params = json!({
            "protocolVersion": "2024-11-05",
            "capabilities": {},
            "clientInfo": {"name": "test-client", "version": "1.0.0"},
        });

        let result = table
            .handle_request(&session, methods::INITIALIZE, Some(params))
            .await
            .unwrap();

        assert!(result["capabilities"]["tools"].is_object());
        assert!(result["capabilities"]["resources"].is_null());
        assert!(result["capabilities"]["prompts"].is_null());
        assert_eq!(session.protocol_version().await.unwrap().as_str(), "2024-11-05");
    }

    #[tokio::test]
    async fn tools_list_without_a_provider_is_unsupported() {
        let table = ServerHandlerTable::new(
            ServerInfo {
                name: "bare".to_string(),
                version: "0.1.0".to_string(),
            },
            None,
        );
        let session = session().await;

        let err = table
            .handle_request(&session, methods::TOOLS_LIST, None)
            .await
            .unwrap_err();
        matches!(err, HandlerError::Mcp(McpError::UnsupportedCapability { .. }));
    }

    #[tokio::test]
    async fn tools_call_round_trips_through_the_math_provider() {
        let table = table();
        let session = session().await;
        let params = json!({"name": "subtract", "arguments": {"a": 5, "b": 3}});

        let result = table
            .handle_request(&session, methods::TOOLS_CALL, Some(params))
            .await
            .unwrap();

        assert_eq!(result["isError"], json!(false));
        assert!(!result["content"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_tool_name_surfaces_as_a_result_error_not_a_protocol_error() {
        let table = table();
        let session = session().await;
        let params = json!({"name": "does-not-exist", "arguments": {}});

        let result = table
            .handle_request(&session, methods::TOOLS_CALL, Some(params))
            .await
            .unwrap();

        assert_eq!(result["isError"], json!(true));
    }

    #[test]
    fn paginate_splits_at_the_page_size_and_returns_a_cursor() {
        let items: Vec<usize> = (0..(LIST_PAGE_SIZE + 10)).collect();

        let (page, next_cursor) = paginate(items.clone(), None).unwrap();
        assert_eq!(page.len(), LIST_PAGE_SIZE);
        assert_eq!(page, items[..LIST_PAGE_SIZE]);
        let cursor = next_cursor.expect("a further page remains");

        let (page, next_cursor) = paginate(items.clone(), Some(cursor)).unwrap();
        assert_eq!(page, items[LIST_PAGE_SIZE..]);
        assert!(next_cursor.is_none());
    }

    #[test]
    fn paginate_rejects_a_malformed_cursor() {
        let err = paginate(vec![1, 2, 3], Some("not-a-number".to_string())).unwrap_err();
        assert!(matches!(err, HandlerError::InvalidParams(_)));
    }

    #[tokio::test]
    async fn tools_list_consults_the_request_cursor() {
        let table = table();
        let session = session().await;

        let first = table
            .handle_request(&session, methods::TOOLS_LIST, None)
            .await
            .unwrap();
        assert!(first["nextCursor"].is_null());
        assert!(!first["tools"].as_array().unwrap().is_empty());

        let err = table
            .handle_request(&session, methods::TOOLS_LIST, Some(json!({"cursor": "not-a-number"})))
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::InvalidParams(_)));
    }

    #[tokio::test]
    async fn unknown_method_is_method_not_found() {
        let table = table();
        let session = session().await;

        let err = table
            .handle_request(&session, "bogus/method", None)
            .await
            .unwrap_err();
        assert!(matches!(err, HandlerError::MethodNotFound(m) if m == "bogus/method"));
    }
}
