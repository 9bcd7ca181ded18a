//! クリップボードストア
//!
//! サーバー上のメモリ内クリップボードを管理します。
//! エントリは新しい順に保持され、IDは常に `len - 1 - index` になります。

use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use thiserror::Error;

use clipboard_relay_common::utils::time::now_entry_time;

/// クリップボードエラー
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ClipboardError {
    /// 負のID
    #[error("IDに負の値は指定できません: {0}")]
    NegativeId(i64),

    /// 存在しないID
    #[error("無効なエントリID: {0}")]
    InvalidId(i64),

    /// シリアライズエラー
    #[error("クリップボードのシリアライズに失敗しました: {0}")]
    SerializeError(String),
}

/// クリップボードエントリ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// エントリID
    #[serde(rename = "ID")]
    pub id: usize,
    /// 内容
    #[serde(rename = "Content")]
    pub content: String,
    /// 追加日時
    #[serde(rename = "Time")]
    pub time: String,
}

/// メモリ内クリップボード
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    /// エントリ（新しい順）
    entries: Vec<Entry>,
}

impl Clipboard {
    /// 空のクリップボードを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// エントリを追加し、割り当てたIDを返す
    pub fn add_entry(&mut self, content: impl Into<String>) -> usize {
        let id = self.entries.len();
        self.entries.insert(
            0,
            Entry {
                id,
                content: content.into(),
                time: now_entry_time(),
            },
        );
        id
    }

    /// 指定IDのエントリを削除
    ///
    /// 位置ではなく `id` が一致するエントリを削除します。
    pub fn delete_entry(&mut self, id: i64) -> Result<Entry, ClipboardError> {
        if id < 0 {
            return Err(ClipboardError::NegativeId(id));
        }

        let index = self
            .entries
            .iter()
            .position(|entry| entry.id as i64 == id)
            .ok_or(ClipboardError::InvalidId(id))?;

        let removed = self.entries.remove(index);
        self.reindex();
        Ok(removed)
    }

    /// クリップボードを空にする
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// エントリ一覧を取得
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// エントリ数を取得
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// ダウンロード用のJSON表現を取得
    pub fn download(&self) -> Result<String, ClipboardError> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.entries
            .serialize(&mut serializer)
            .map_err(|e| ClipboardError::SerializeError(e.to_string()))?;

        String::from_utf8(buf).map_err(|e| ClipboardError::SerializeError(e.to_string()))
    }

    /// IDを振り直す
    fn reindex(&mut self) {
        let n = self.entries.len();
        for (i, entry) in self.entries.iter_mut().enumerate() {
            entry.id = n - 1 - i;
        }
    }
}
