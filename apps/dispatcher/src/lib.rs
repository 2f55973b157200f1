//! # Mailcast Dispatcher ライブラリ
//!
//! 配信パイプラインと設定読み込みを公開する。
//! バイナリ（`main.rs`）と統合テストの両方から使用する。

pub mod config;
pub mod error;
pub mod usecase;

// テストユーティリティ（内部実装、ドキュメントからは隠す）
#[cfg(feature = "test-utils")]
#[doc(hidden)]
pub mod test_utils;
