//! Core library for playing and scoring Connections word puzzles with a
//! conversational LLM agent.
//!
//! The pieces compose in one direction: a [`puzzle::PuzzleSource`] yields the
//! day's puzzle document, [`model::Puzzle`] validates it into four disjoint
//! categories, [`engine::GameSession`] drives the prompt/reply turn loop
//! against a [`providers::llm::Conversation`], and [`harness::Harness`] runs
//! many sessions concurrently against an idempotent [`harness::Ledger`].

pub mod engine;
pub mod errors;
pub mod evaluator;
pub mod harness;
pub mod model;
pub mod parser;
pub mod prompt;
pub mod providers;
pub mod puzzle;
pub mod share;
