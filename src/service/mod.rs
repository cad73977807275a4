pub mod anchor_service;
pub mod error;
pub mod matching_service;
pub mod scoring;
