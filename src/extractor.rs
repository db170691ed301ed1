//! 지표 추출 모듈
//!
//! 개별 결과 파일을 읽어 지표 값 하나를 꺼냅니다. 어떤 실패도 호출자에게
//! 전파되지 않고 NA 레코드로 바뀝니다.

use memmap2::Mmap;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::{CollectorError, Result};

/// 이 크기 이상이면 메모리 매핑으로 읽음
const MMAP_THRESHOLD: u64 = 10 * 1024 * 1024; // 10MB

/// 지표를 쓸 수 없는 이유
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NaReason {
    /// 파일을 열 수 없거나 JSON 객체가 아님
    Unreadable,
    /// 최상위 `error` 필드가 null이 아님
    UpstreamError,
    /// 지표 키가 없음
    MissingKey,
    /// 값을 숫자로 바꿀 수 없음
    NonNumeric,
}

impl NaReason {
    /// 파일 상세 목록에 기록되는 태그
    pub fn tag(&self) -> &'static str {
        match self {
            NaReason::Unreadable => "unreadable",
            NaReason::UpstreamError => "upstream-error",
            NaReason::MissingKey => "missing-key",
            NaReason::NonNumeric => "non-numeric",
        }
    }
}

/// 파일 하나에서 추출한 결과
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    /// 숫자로 변환된 지표 값
    Value(f64),
    /// NA, 숫자가 아닌 경우에는 원래 값을 함께 보관
    NotAvailable {
        reason: NaReason,
        raw: Option<Value>,
    },
}

impl Extracted {
    fn na(reason: NaReason) -> Self {
        Extracted::NotAvailable { reason, raw: None }
    }
}

/// 파일 경로와 추출 결과
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedRecord {
    /// 탐색된 파일 경로
    pub path: PathBuf,
    /// 추출 결과
    pub extracted: Extracted,
}

impl ExtractedRecord {
    /// 유효한 숫자 값 (NA면 None)
    pub fn value(&self) -> Option<f64> {
        match self.extracted {
            Extracted::Value(v) => Some(v),
            Extracted::NotAvailable { .. } => None,
        }
    }
}

/// 파일 목록 전체에서 지표 추출 (탐색 순서 유지)
pub fn collect_records<'a, I>(files: I, metric_key: &str) -> Vec<ExtractedRecord>
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    files
        .into_iter()
        .map(|path| load_record(path, metric_key))
        .collect()
}

/// 단일 파일에서 지표 추출
///
/// 판정 순서: 읽기/파싱 실패, `error` 필드, 키 누락, 숫자 변환 실패.
///
/// # Arguments
/// * `path` - 결과 JSON 파일 경로
/// * `metric_key` - 읽을 최상위 키
pub fn load_record(path: &Path, metric_key: &str) -> ExtractedRecord {
    ExtractedRecord {
        path: path.to_path_buf(),
        extracted: extract(path, metric_key),
    }
}

fn extract(path: &Path, metric_key: &str) -> Extracted {
    let object = match read_object(path) {
        Ok(object) => object,
        Err(e) => {
            log::debug!("{e}");
            return Extracted::na(NaReason::Unreadable);
        }
    };

    if let Some(error) = object.get("error").filter(|v| !v.is_null()) {
        log::debug!(
            "Error found in {}: {}, returning NA",
            path.display(),
            error
        );
        return Extracted::na(NaReason::UpstreamError);
    }

    let Some(raw) = object.get(metric_key) else {
        let keys: Vec<&String> = object.keys().collect();
        log::debug!(
            "Key '{metric_key}' not found in {}, available keys: {keys:?}",
            path.display()
        );
        return Extracted::na(NaReason::MissingKey);
    };

    match coerce_number(raw) {
        Some(value) => {
            log::debug!("Extracted {metric_key}={value} from {}", path.display());
            Extracted::Value(value)
        }
        None => {
            log::debug!(
                "Skipping non-numeric value {raw} from {}",
                path.display()
            );
            Extracted::NotAvailable {
                reason: NaReason::NonNumeric,
                raw: Some(raw.clone()),
            }
        }
    }
}

/// JSON 값을 배정밀도 숫자로 변환
///
/// 숫자, 숫자 형태의 문자열(앞뒤 공백 허용, `inf`/`nan` 포함), 불리언(1/0)을 받습니다.
///
/// # Examples
/// ```
/// use metric_collector::extractor::coerce_number;
/// use serde_json::json;
///
/// assert_eq!(coerce_number(&json!(12.5)), Some(12.5));
/// assert_eq!(coerce_number(&json!(" 7 ")), Some(7.0));
/// assert_eq!(coerce_number(&json!("invalid")), None);
/// ```
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        // f64 범위를 넘는 숫자(예: 1e400)는 원래 표기로 다시 파싱해 ±inf가 됨
        Value::Number(n) => n.as_f64().or_else(|| n.to_string().parse::<f64>().ok()),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// 파일을 읽어 최상위 JSON 객체로 파싱
fn read_object(path: &Path) -> Result<Map<String, Value>> {
    let file_size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

    let json = if file_size >= MMAP_THRESHOLD {
        parse_with_mmap(path)?
    } else {
        parse_with_reader(path)?
    };

    match json {
        Value::Object(map) => Ok(map),
        _ => Err(CollectorError::NotAnObject {
            file: path.to_path_buf(),
        }),
    }
}

/// 버퍼 리더를 사용한 JSON 파싱
fn parse_with_reader(path: &Path) -> Result<Value> {
    let file = File::open(path).map_err(|e| CollectorError::FileOpenError {
        file: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|e| CollectorError::ParseError {
        file: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// 메모리 매핑을 사용한 JSON 파싱 (대용량 파일용)
fn parse_with_mmap(path: &Path) -> Result<Value> {
    let file = File::open(path).map_err(|e| CollectorError::FileOpenError {
        file: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    // 읽는 동안 다른 프로세스가 파일을 줄이지 않는다고 가정
    let mmap = unsafe {
        Mmap::map(&file).map_err(|e| CollectorError::FileOpenError {
            file: path.to_path_buf(),
            reason: format!("메모리 매핑 실패: {}", e),
        })?
    };

    serde_json::from_slice(&mmap).map_err(|e| CollectorError::ParseError {
        file: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_numeric_value() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.json", r#"{"result": 10.5, "error": null}"#);

        let record = load_record(&path, "result");
        assert_eq!(record.extracted, Extracted::Value(10.5));
        assert_eq!(record.value(), Some(10.5));
        assert_eq!(record.path, path);
    }

    #[test]
    fn test_upstream_error_wins_over_valid_metric() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.json", r#"{"result": 3.0, "error": "computation failed"}"#);

        let record = load_record(&path, "result");
        assert_eq!(record.extracted, Extracted::na(NaReason::UpstreamError));
        assert_eq!(record.value(), None);
    }

    #[test]
    fn test_missing_key() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.json", r#"{"score": 1}"#);

        let record = load_record(&path, "result");
        assert_eq!(record.extracted, Extracted::na(NaReason::MissingKey));
    }

    #[test]
    fn test_non_numeric_keeps_raw_value() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.json", r#"{"result": "invalid"}"#);

        let record = load_record(&path, "result");
        assert_eq!(
            record.extracted,
            Extracted::NotAvailable {
                reason: NaReason::NonNumeric,
                raw: Some(json!("invalid")),
            }
        );
    }

    #[test]
    fn test_null_and_list_are_non_numeric() {
        let dir = TempDir::new().unwrap();
        let null_path = write(&dir, "null.json", r#"{"result": null}"#);
        let list_path = write(&dir, "list.json", r#"{"result": [1, 2]}"#);

        for path in [null_path, list_path] {
            match load_record(&path, "result").extracted {
                Extracted::NotAvailable { reason, .. } => assert_eq!(reason, NaReason::NonNumeric),
                other => panic!("expected NA, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_unreadable_inputs() {
        let dir = TempDir::new().unwrap();
        let broken = write(&dir, "broken.json", r#"{"result": 1, broken"#);
        let array = write(&dir, "array.json", r#"[{"result": 1}]"#);
        let empty = write(&dir, "empty.json", "");
        let missing = dir.path().join("vanished.json");

        for path in [broken, array, empty, missing] {
            let record = load_record(&path, "result");
            assert_eq!(record.extracted, Extracted::na(NaReason::Unreadable));
        }
    }

    #[test]
    fn test_collect_records_keeps_order() {
        let dir = TempDir::new().unwrap();
        let files = vec![
            write(&dir, "b.json", r#"{"result": 2}"#),
            write(&dir, "a.json", r#"{"result": 1}"#),
            write(&dir, "c.json", r#"{"other": 3}"#),
        ];

        let records = collect_records(&files, "result");
        let values: Vec<Option<f64>> = records.iter().map(|r| r.value()).collect();
        assert_eq!(values, vec![Some(2.0), Some(1.0), None]);
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number(&json!(3)), Some(3.0));
        assert_eq!(coerce_number(&json!(-2.5)), Some(-2.5));
        assert_eq!(coerce_number(&json!("1e3")), Some(1000.0));
        assert_eq!(coerce_number(&json!(true)), Some(1.0));
        assert_eq!(coerce_number(&json!(false)), Some(0.0));
        assert!(coerce_number(&json!("nan")).unwrap().is_nan());
        assert_eq!(coerce_number(&json!("inf")), Some(f64::INFINITY));
        assert_eq!(coerce_number(&json!("")), None);
        assert_eq!(coerce_number(&json!(null)), None);
        assert_eq!(coerce_number(&json!({"a": 1})), None);
    }

    #[test]
    fn test_out_of_range_number_in_other_field() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.json", r#"{"result": 5, "other": 1e400}"#);

        let record = load_record(&path, "result");
        assert_eq!(record.extracted, Extracted::Value(5.0));
    }

    #[test]
    fn test_out_of_range_metric_becomes_infinity() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "a.json", r#"{"result": 1e400}"#);
        let negative = write(&dir, "b.json", r#"{"result": -1e400}"#);

        assert_eq!(load_record(&path, "result").value(), Some(f64::INFINITY));
        assert_eq!(
            load_record(&negative, "result").value(),
            Some(f64::NEG_INFINITY)
        );
    }

    #[test]
    fn test_reason_tags() {
        assert_eq!(NaReason::Unreadable.tag(), "unreadable");
        assert_eq!(NaReason::UpstreamError.tag(), "upstream-error");
        assert_eq!(NaReason::MissingKey.tag(), "missing-key");
        assert_eq!(NaReason::NonNumeric.tag(), "non-numeric");
    }
}
