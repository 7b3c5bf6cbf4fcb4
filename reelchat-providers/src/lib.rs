//! LLM provider integration for reelchat
//!
//! This crate provides the provider abstraction used by the inference
//! gateway and a client for OpenAI-compatible chat-completion APIs.

pub mod base;
pub mod client;

pub use base::{LLMProvider, LLMResponse, Message, ProviderError, ProviderResult};
pub use client::ChatCompletionsClient;
