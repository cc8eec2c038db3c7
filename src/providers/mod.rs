//! Production-ready MCP Provider Implementations
//!
//! This module provides comprehensive, production-ready implementations of MCP providers
//! that can be used directly in applications or serve as reference implementations.
//!
//! # Provider Types
//!
//! - **Resource Providers**: File system, configuration, database access
//! - **Tool Providers**: Mathematical operations, system tools, AI utilities  
//! - **Prompt Providers**: Code review templates, documentation generators
//! - **Logging Handlers**: Structured logging with various backends
//!
//! # Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use airs_mcp::providers::{FileSystemResourceProvider, MathToolProvider, CodeReviewPromptProvider};
//! use airs_mcp::integration::{McpServerBuilder, McpServerConfig};
//! use airs_mcp::transport::stdio::StdioTransportBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let server = McpServerBuilder::new(McpServerConfig::default())
//!         .resource_provider(Arc::new(FileSystemResourceProvider::new("/safe/path")?))
//!         .tool_provider(Arc::new(MathToolProvider::new()))
//!         .prompt_provider(Arc::new(CodeReviewPromptProvider::new()))
//!         .build();
//!
//!     server.serve(StdioTransportBuilder::<()>::new(), "stdio-peer").await?;
//!     Ok(())
//! }
//! ```

pub mod logging;
pub mod prompt;
pub mod resource;
pub mod tool;

// Re-export main provider types for convenience
pub use logging::{FileLoggingHandler, LoggingHandler, StructuredLoggingHandler};
pub use prompt::{
    AnalysisPromptProvider, CodeReviewPromptProvider, DocumentationPromptProvider, PromptProvider,
};
pub use resource::{
    ConfigurationResourceProvider, DatabaseResourceProvider, FileSystemResourceProvider,
    ResourceProvider,
};
pub use tool::{MathToolProvider, SystemToolProvider, TextToolProvider, ToolProvider};
