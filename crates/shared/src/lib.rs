//! # Mailcast 共有ユーティリティ
//!
//! ワークスペース全体で使用される共通ユーティリティを提供する。
//!
//! ## 設計方針
//!
//! - 他のすべてのクレート（domain, infra, dispatcher）から依存される
//! - 配信ロジックを含まない純粋なユーティリティのみを配置
//! - 外部クレートへの依存は最小限に抑える（subscriber 系は `observability` feature）

pub mod event_log;
pub mod observability;
