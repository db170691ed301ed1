//! 결과 저장 모듈
//!
//! 집계 결과와 실행 메타데이터를 합쳐 `metrics.json`으로 저장하고,
//! 해석된 설정과 실행 환경을 `cli.txt`로 남깁니다.

use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::Config;
use crate::error::{CollectorError, Result};
use crate::extractor::{Extracted, ExtractedRecord};
use crate::stats::Aggregate;

/// 집계 결과 파일 이름
pub const METRICS_FILE: &str = "metrics.json";

/// 디버그 덤프 파일 이름
pub const CLI_FILE: &str = "cli.txt";

/// 접두사가 붙지 않는 키
pub const UNPREFIXED_KEYS: [&str; 4] = [
    "files_details",
    "input_pattern",
    "metric_key",
    "aggregation_type",
];

/// 시작 시 한 번 수집되는 실행 환경
#[derive(Debug, Clone)]
pub struct RunContext {
    /// 실행 파일 이름
    pub program: String,
    /// 프로그램 이름을 제외한 원본 인자
    pub args: Vec<String>,
    /// 작업 폴더
    pub cwd: PathBuf,
    /// 런타임 버전 문자열
    pub runtime: String,
}

impl RunContext {
    /// 프로그램 이름을 포함한 인자 벡터와 현재 환경으로 컨텍스트 생성
    pub fn capture(mut argv: Vec<String>) -> Self {
        let program = if argv.is_empty() {
            env!("CARGO_PKG_NAME").to_string()
        } else {
            argv.remove(0)
        };

        Self {
            program,
            args: argv,
            cwd: resolve_cwd(std::env::current_dir()),
            runtime: runtime_version(),
        }
    }

    /// 작업 폴더 기준 절대 경로
    pub fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.cwd.join(path)
        }
    }
}

/// 작업 폴더 조회 결과, 실패하면 경고 후 "."
fn resolve_cwd(cwd: std::io::Result<PathBuf>) -> PathBuf {
    cwd.unwrap_or_else(|e| {
        log::warn!("현재 작업 폴더를 확인할 수 없어 \".\"을 사용합니다: {e}");
        PathBuf::from(".")
    })
}

/// 빌드에 쓰인 rustc 버전과 바이너리 정보
///
/// 예: `rustc 1.83.0 (90b35a623 2024-11-26); metric-collector 0.1.0 (linux x86_64)`
pub fn runtime_version() -> String {
    format!(
        "{}; {} {} ({} {})",
        env!("METRIC_COLLECTOR_RUSTC_VERSION"),
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

/// 출력 폴더 생성 (상위 폴더 포함)
pub fn prepare_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| CollectorError::CreateOutputDir {
        path: dir.to_path_buf(),
        reason: e.to_string(),
    })
}

/// 파일 하나의 상세 정보
fn file_detail(record: &ExtractedRecord) -> Value {
    let file = record.path.display().to_string();

    match &record.extracted {
        Extracted::Value(value) => json!({ "file": file, "value": value }),
        Extracted::NotAvailable { reason, raw } => {
            let mut detail = json!({ "file": file, "value": "NA", "error": reason.tag() });
            if let (Some(raw), Value::Object(map)) = (raw, &mut detail) {
                map.insert("raw_value".to_string(), raw.clone());
            }
            detail
        }
    }
}

/// 집계 결과와 메타데이터를 합친 결과 문서 생성
pub fn build_result(config: &Config, records: &[ExtractedRecord], aggregate: &Aggregate) -> Value {
    let mut result = Map::new();

    result.insert(
        "aggregation_type".to_string(),
        json!(config.aggregation.as_str()),
    );
    result.insert("metric_key".to_string(), json!(config.metric_key));
    result.insert("input_pattern".to_string(), json!(config.input_pattern));
    result.insert("files_processed".to_string(), json!(records.len()));
    result.insert(
        "files_details".to_string(),
        Value::Array(records.iter().map(file_detail).collect()),
    );
    result.extend(aggregate.to_json_map());

    Value::Object(apply_prefix(result, &config.prefix))
}

/// 메타데이터 키 네 개를 제외한 모든 키에 `{prefix}_` 접두사 적용
///
/// 접두사가 비어 있으면 맵을 그대로 돌려줍니다.
pub fn apply_prefix(map: Map<String, Value>, prefix: &str) -> Map<String, Value> {
    if prefix.is_empty() {
        return map;
    }

    map.into_iter()
        .map(|(key, value)| {
            if UNPREFIXED_KEYS.contains(&key.as_str()) {
                (key, value)
            } else {
                (format!("{prefix}_{key}"), value)
            }
        })
        .collect()
}

/// 파일을 하나도 찾지 못했을 때의 결과 문서
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveryFailure {
    pub error: String,
    pub pattern_used: String,
    pub search_directory: String,
}

/// 탐색 실패 결과 생성
pub fn no_files_result(pattern: &str, ctx: &RunContext) -> DiscoveryFailure {
    DiscoveryFailure {
        error: format!("No data files found with pattern: {pattern}"),
        pattern_used: pattern.to_string(),
        search_directory: ctx.cwd.display().to_string(),
    }
}

/// 결과 문서를 `metrics.json`으로 저장 (들여쓰기 2칸)
pub fn write_metrics<T: Serialize + ?Sized>(output_dir: &Path, result: &T) -> Result<PathBuf> {
    let path = output_dir.join(METRICS_FILE);

    let content = serde_json::to_string_pretty(result).map_err(|e| {
        CollectorError::SerializeError {
            reason: e.to_string(),
        }
    })?;

    fs::write(&path, content).map_err(|e| CollectorError::WriteError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(path)
}

/// `cli.txt` 내용 생성
pub fn render_cli_debug(config: &Config, ctx: &RunContext) -> String {
    fn or_none(value: &Option<String>) -> &str {
        value.as_deref().unwrap_or("None")
    }

    let mut lines = vec![
        "=== METRIC COLLECTOR CLI DEBUG ===".to_string(),
        format!("Program: {}", ctx.program),
        format!("Arguments: {}", ctx.args.join(" ")),
        String::new(),
        "=== PARSED ARGUMENTS ===".to_string(),
        format!("input_pattern: {}", config.input_pattern),
        format!("output_dir: {}", config.output_dir.display()),
        format!("metric_key: {}", config.metric_key),
        format!("aggregation: {}", config.aggregation),
        format!("debug: {}", config.debug),
        format!("prefix: {}", config.prefix),
        format!("collector: {}", or_none(&config.collector)),
        format!("extra: {:?}", config.extra),
        format!("name: {}", or_none(&config.name)),
    ];

    if !config.dynamic_args.is_empty() {
        lines.push(String::new());
        lines.push("=== DYNAMIC ARGUMENTS ===".to_string());
        for (flag, values) in &config.dynamic_args {
            lines.push(format!("{flag}: {values:?}"));
        }
    }

    lines.extend([
        String::new(),
        "=== ENVIRONMENT ===".to_string(),
        format!("Runtime: {}", ctx.runtime),
        format!("Working directory: {}", ctx.cwd.display()),
        format!(
            "Output directory: {}",
            ctx.absolute(&config.output_dir).display()
        ),
    ]);

    lines.join("\n")
}

/// 설정 덤프를 `cli.txt`로 저장
pub fn write_cli_debug(output_dir: &Path, config: &Config, ctx: &RunContext) -> Result<PathBuf> {
    let path = output_dir.join(CLI_FILE);

    fs::write(&path, render_cli_debug(config, ctx)).map_err(|e| CollectorError::WriteError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(path)
}
