//! 에러 타입 정의 모듈
//!
//! metric-collector에서 발생할 수 있는 모든 에러 타입을 정의합니다.

use std::path::PathBuf;
use thiserror::Error;

/// metric-collector에서 발생할 수 있는 에러 타입
#[derive(Error, Debug)]
pub enum CollectorError {
    /// 필수 인자 --output_dir 누락
    #[error("--output_dir is required")]
    MissingOutputDir,

    /// 출력 폴더 생성 실패
    #[error("출력 폴더를 만들 수 없습니다 ({path}): {reason}")]
    CreateOutputDir { path: PathBuf, reason: String },

    /// 결과 파일 쓰기 실패
    #[error("파일 쓰기 실패 ({path}): {reason}")]
    WriteError { path: PathBuf, reason: String },

    /// JSON 직렬화 실패
    #[error("JSON 직렬화 실패: {reason}")]
    SerializeError { reason: String },

    /// 유효하지 않은 글로브 패턴
    #[error("유효하지 않은 패턴: {pattern} ({reason})")]
    InvalidPattern { pattern: String, reason: String },

    /// JSON 파일 열기 실패
    #[error("파일을 열 수 없습니다 ({file}): {reason}")]
    FileOpenError { file: PathBuf, reason: String },

    /// JSON 파싱 실패
    #[error("JSON 파싱 실패 ({file}): {reason}")]
    ParseError { file: PathBuf, reason: String },

    /// 최상위 값이 JSON 객체가 아님
    #[error("JSON 객체가 아닙니다: {file}")]
    NotAnObject { file: PathBuf },
}

/// metric-collector 결과 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
