//! Duologue - two LLM participants in a moderated discussion
//!
//! A pure turn scheduler decides who acts next, a driver carries out each
//! action through the participant and summarizer ports, and the append-only
//! conversation state records the result.

pub mod config;
pub mod conversation;
pub mod export;
pub mod llm;
pub mod ports;
pub mod runtime;
pub mod state_machine;
