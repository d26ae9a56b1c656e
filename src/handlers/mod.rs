//! HTTP request handlers
//!
//! This module organizes all API handlers into logical groups:
//! - `api` - Health check endpoint
//! - `answer` - Conversational answer generation
//! - `artifacts` - Stored artifact retrieval
//! - `narrate` - Speech narration generation and lookup

pub mod api;
pub mod answer;
pub mod artifacts;
pub mod narrate;
