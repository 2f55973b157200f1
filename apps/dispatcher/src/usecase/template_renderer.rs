//! # テンプレートレンダラー
//!
//! tera テンプレートエンジンで受信者ごとの HTML 本文を生成する。
//!
//! ## 設計方針
//!
//! - **`include_str!` によるコンパイル時埋め込み**: 既定テンプレート `welcome.html` はバイナリに埋め込まれる
//! - **追加テンプレート**: 起動時に指定されたファイルをファイル名で登録する
//! - **自動エスケープ**: `.html` で終わるテンプレートでは変数が HTML エスケープされる
//! - **並行呼び出し**: `render` は `&self` のみを取り、呼び出し間で状態を共有しない
//!
//! ## テンプレート変数
//!
//! | 変数 | 値 |
//! |------|----|
//! | `name` | 受信者名 |
//! | `email` / `address` | 受信者アドレス |
//! | `subject` | キャンペーン件名 |
//! | `message` | キャンペーン本文メッセージ |

use std::{error::Error as _, path::Path};

use mailcast_domain::{RenderError, message::RenderContext};
use tera::{Context, Tera};

/// 埋め込みの既定テンプレート名
pub const DEFAULT_TEMPLATE: &str = "welcome.html";

/// 本文レンダラートレイト
///
/// 複数ワーカーから異なるコンテキストで同時に呼び出される。
/// ある受信者のレンダリング失敗が他の受信者に影響してはならない。
pub trait MessageRenderer: Send + Sync {
    /// `template` を `context` で評価して本文を返す
    fn render(&self, template: &str, context: &RenderContext) -> Result<String, RenderError>;
}

/// tera によるテンプレートレンダラー
pub struct TemplateRenderer {
    engine: Tera,
}

impl TemplateRenderer {
    /// 既定テンプレートを登録したレンダラーを作成
    pub fn new() -> Result<Self, RenderError> {
        let mut engine = Tera::default();

        engine
            .add_raw_template(
                DEFAULT_TEMPLATE,
                include_str!("../../templates/welcome.html"),
            )
            .map_err(|e| RenderError::Failed(describe(&e)))?;

        Ok(Self { engine })
    }

    /// テンプレートファイルを追加登録する
    ///
    /// ファイル名（例: `promo.html`）がテンプレート識別子になり、登録した識別子を返す。
    pub fn register_file(&mut self, path: &Path) -> Result<String, RenderError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| RenderError::TemplateNotFound(path.display().to_string()))?
            .to_string();

        self.engine
            .add_template_file(path, Some(&name))
            .map_err(|e| RenderError::Failed(describe(&e)))?;

        tracing::debug!(template = %name, path = %path.display(), "テンプレートを登録");
        Ok(name)
    }

    /// 登録済みテンプレートかどうか
    pub fn has_template(&self, name: &str) -> bool {
        self.engine.get_template_names().any(|n| n == name)
    }

    fn build_context(context: &RenderContext) -> Context {
        let mut vars = Context::new();
        vars.insert("name", context.name());
        vars.insert("email", context.address());
        vars.insert("address", context.address());
        vars.insert("subject", context.subject());
        vars.insert("message", context.message());
        vars
    }
}

impl MessageRenderer for TemplateRenderer {
    fn render(&self, template: &str, context: &RenderContext) -> Result<String, RenderError> {
        self.engine
            .render(template, &Self::build_context(context))
            .map_err(|e| match &e.kind {
                tera::ErrorKind::TemplateNotFound(name) => RenderError::TemplateNotFound(name.clone()),
                _ => RenderError::Failed(describe(&e)),
            })
    }
}

/// tera のエラーは原因がネストされるため、チェーン全体を 1 行にまとめる
fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
