use thiserror::Error;

/// エラー型の定義
#[derive(Error, Debug)]
pub enum Error {
    #[error("入出力エラー")]
    Io(#[source] std::io::Error),

    #[error("データ形式エラー: {0}")]
    Format(String),

    #[error("データがありません: {0}")]
    EmptyData(String),

    #[error("データ不足エラー: {0}")]
    InsufficientData(String),

    #[error("次元不一致エラー: {0}")]
    DimensionMismatch(String),

    #[error("無効な入力です: {0}")]
    InvalidInput(String),

    #[error("無効な値です: {0}")]
    InvalidValue(String),

    #[error("計算エラー: {0}")]
    ComputationError(String),

    #[error("サンプリングエラー: {0}")]
    Sampling(String),

    #[error("インデックスが範囲外です: インデックス {index}, サイズ {size}")]
    IndexOutOfBounds { index: usize, size: usize },
}

/// Resultの型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}
