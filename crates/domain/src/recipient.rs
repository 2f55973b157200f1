//! # 受信者
//!
//! 配信対象 1 件を表す値。受信者リストから生成され、1 つのワーカーが
//! 処理し終えた時点で破棄される。重複排除や保持は行わない。

use derive_more::Display;

/// 受信者（名前 + メールアドレス）
///
/// 生成後は変更できない。フィールドは読み取り専用のアクセサ経由で参照する。
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("{name} <{address}>")]
pub struct Recipient {
    name:    String,
    address: String,
}

impl Recipient {
    /// 受信者を作成する
    ///
    /// 形式の検証は受信者ソースと送信トランスポートの責務とし、ここでは行わない。
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name:    name.into(),
            address: address.into(),
        }
    }

    /// 表示名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// メールアドレス
    pub fn address(&self) -> &str {
        &self.address
    }
}
