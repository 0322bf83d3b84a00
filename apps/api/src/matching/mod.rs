pub mod chunker;
pub mod discovery;
pub mod engine;
pub mod handlers;
pub mod normalizer;
pub mod overlap;
pub mod skill_matcher;
pub mod vocabulary;
