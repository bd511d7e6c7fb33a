//! 类型系统模块：定义批处理调用结果的核心数据类型。
//!
//! # Types Module
//!
//! Strongly-typed representations of what a single call inside a batch
//! resolves to once its raw wire entry has been decoded.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`CallValue`] | Decoded facet of one call's response (body, page, status, headers) |
//! | [`CallResult`] | `Result<CallValue, CallError>` placed at each slot of the output |
//! | [`GraphPage`] | Pageable collection wrapper around a `data` array body |
//! | [`RawResult`] | One positional entry of a batch response as sent on the wire |
//!
//! ## Submodules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`value`] | Call values and raw wire entries |
//! | [`page`] | Pagination wrapper |
//!
//! ## Example
//!
//! ```rust
//! use graph_batch_rust::types::{CallValue, GraphPage};
//! use serde_json::json;
//!
//! let value = GraphPage::evaluate(json!({
//!     "data": [{"id": "1"}, {"id": "2"}],
//!     "paging": {"next": "https://graph.example.com/me/friends?after=XYZ&limit=2"}
//! }));
//! match value {
//!     CallValue::Page(page) => assert_eq!(page.len(), 2),
//!     other => panic!("expected page, got {:?}", other),
//! }
//! ```

pub mod page;
pub mod value;

pub use page::GraphPage;
pub use value::{CallResult, CallValue, RawHeader, RawResult};
