//! スクリプト境界の JSON 形式
//!
//! スクリプトはメソッド名と位置引数（文字列）で呼び出します。
//! 例: `{"method":"saveBase64File","args":["save/file1.rpgsave","SGVsbG8="]}`
//!
//! 1 回の呼び出しに対して `BridgeReply` を必ず 1 つ返します。

use serde::{Deserialize, Serialize};

use crate::domain::{BridgeError, BridgeMethod, ErrorKind, WriteReceipt, WriteRequest, WriteResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeCall {
    pub method: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl BridgeCall {
    pub fn new(method: BridgeMethod, args: [&str; 2]) -> Self {
        Self {
            method: method.name().to_string(),
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, BridgeError> {
        serde_json::from_str(raw).map_err(|e| BridgeError::InvalidCall(format!("json decode: {e}")))
    }

    pub fn to_request(&self) -> Result<WriteRequest, BridgeError> {
        let method = BridgeMethod::from_name(&self.method)
            .ok_or_else(|| BridgeError::InvalidCall(format!("unknown method '{}'", self.method)))?;
        if self.args.len() != method.arity() {
            return Err(BridgeError::InvalidCall(format!(
                "{} expects {} arguments, got {}",
                method.name(),
                method.arity(),
                self.args.len()
            )));
        }

        let (first, second) = (self.args[0].clone(), self.args[1].clone());
        Ok(match method {
            BridgeMethod::SaveBase64File => WriteRequest::private_file(first, second),
            BridgeMethod::SaveToDownloads => WriteRequest::download_file(first, second),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyError {
    pub kind: ErrorKind,
    pub message: String,
}

/// 成功: `{"ok":true,"location":...}`
/// 失敗: `{"ok":false,"error":{"kind":...,"message":...}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeReply {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ReplyError>,
}

impl BridgeReply {
    pub fn success(receipt: &WriteReceipt) -> Self {
        Self {
            ok: true,
            location: Some(receipt.location()),
            error: None,
        }
    }

    pub fn failure(err: &BridgeError) -> Self {
        Self {
            ok: false,
            location: None,
            error: Some(ReplyError {
                kind: err.kind(),
                message: err.to_string(),
            }),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<&WriteResult> for BridgeReply {
    fn from(result: &WriteResult) -> Self {
        match result {
            Ok(receipt) => BridgeReply::success(receipt),
            Err(err) => BridgeReply::failure(err),
        }
    }
}
