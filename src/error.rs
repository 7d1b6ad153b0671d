use thiserror::Error;

#[derive(Error, Debug)]
pub enum HfServeError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("hfコマンドエラー: {0}")]
    Gateway(String),

    #[error("hfコマンドがタイムアウトしました ({seconds}秒): {command}")]
    GatewayTimeout { command: String, seconds: u64 },

    #[error("画像が見つかりません: {0}")]
    NotFound(String),

    #[error("検索条件が指定されていません")]
    EmptyFilter,

    #[error("対話入力エラー: {0}")]
    Prompt(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Common(#[from] hf_serve_common::Error),
}

impl HfServeError {
    /// 外部コマンド起因のエラーか（タイムアウト含む）
    pub fn is_gateway(&self) -> bool {
        matches!(self, Self::Gateway(_) | Self::GatewayTimeout { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<dialoguer::Error> for HfServeError {
    fn from(e: dialoguer::Error) -> Self {
        Self::Prompt(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HfServeError>;
