//! インターフェース層
//!
//! HTTP API を提供する

pub mod web;
