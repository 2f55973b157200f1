//! # ユースケース層
//!
//! キャンペーンメール配信のアプリケーションロジックを実装する。
//!
//! ## 設計方針
//!
//! - **依存性注入**: レンダラー・トランスポート・報告先を `Arc<dyn Trait>` で外部から注入
//! - **設定は値で渡す**: グローバル定数を持たず、[`DispatchSettings`] を生成時に受け取る
//!
//! ## モジュール構成
//!
//! - `dispatch`: 配信パイプライン（受信者ソース → 配信チャネル → ワーカー）
//! - `template_renderer`: tera による本文レンダリング
//! - `reporter`: 1 件ごとの配信結果の報告

pub mod dispatch;
pub mod reporter;
pub mod template_renderer;

pub use dispatch::{DispatchPipeline, DispatchSettings, HANDOFF_CAPACITY};
pub use reporter::{DispatchReporter, LogReporter};
pub use template_renderer::{DEFAULT_TEMPLATE, MessageRenderer, TemplateRenderer};
