//! CLI 인자 파싱 모듈
//!
//! 인자 벡터를 플래그 그룹으로 묶고, 알려진 플래그는 [`Config`] 필드로,
//! 나머지는 순서가 유지되는 동적 맵으로 옮깁니다.
//!
//! 알려진 플래그는 정확한 철자로만 인식됩니다. `--input-pattern`은 입력 패턴이지만
//! `--input_pattern`은 동적 맵의 `input_pattern` 항목이 됩니다 (`--output_dir`은 반대).
//! 기존 수집기 호출 스크립트와의 호환을 위해 이 비대칭을 그대로 유지합니다.

use clap::{Command, ValueEnum};
use indexmap::IndexMap;
use std::path::PathBuf;

use crate::error::{CollectorError, Result};

/// 첫 플래그 이전에 나온 토큰이 모이는 그룹 이름
pub const POSITIONAL_KEY: &str = "__positional__";

/// 기본 입력 글로브 패턴
pub const DEFAULT_INPUT_PATTERN: &str = "**/*_data.json";

/// 기본 지표 키
pub const DEFAULT_METRIC_KEY: &str = "result";

/// 집계 모드
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum Aggregation {
    /// 평균
    Avg,
    /// 최댓값
    Max,
    /// 최솟값
    Min,
    /// 합계
    Sum,
    /// 위의 모든 통계
    #[default]
    All,
}

impl Aggregation {
    /// 모드 이름을 파싱 (대소문자 구분, 알 수 없는 값이면 None)
    pub fn parse(value: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(value, false).ok()
    }

    /// 직렬화에 쓰이는 모드 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Avg => "avg",
            Aggregation::Max => "max",
            Aggregation::Min => "min",
            Aggregation::Sum => "sum",
            Aggregation::All => "all",
        }
    }

    /// 이 모드에서 `stat` 통계를 계산해야 하는지 여부
    pub fn includes(&self, stat: Aggregation) -> bool {
        *self == Aggregation::All || *self == stat
    }
}

impl std::fmt::Display for Aggregation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 하나의 플래그와 그 뒤에 이어지는 값들
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagGroup {
    /// 플래그 토큰 그대로 (`--` 포함), 위치 인자 그룹은 [`POSITIONAL_KEY`]
    pub flag: String,
    /// 다음 플래그 전까지의 값 목록
    pub values: Vec<String>,
}

/// 인자 벡터를 플래그 그룹으로 나눔
///
/// `--`로 시작하는 토큰마다 새 그룹이 시작되고, 그 외 토큰은 현재 그룹의 값이 됩니다.
/// 첫 플래그 이전의 토큰은 [`POSITIONAL_KEY`] 그룹으로 모입니다.
///
/// # Examples
/// ```
/// use metric_collector::cli::group_flags;
///
/// let args: Vec<String> = ["--extra", "a", "b", "--debug"].iter().map(|s| s.to_string()).collect();
/// let groups = group_flags(&args);
/// assert_eq!(groups.len(), 2);
/// assert_eq!(groups[0].values, vec!["a", "b"]);
/// ```
pub fn group_flags(args: &[String]) -> Vec<FlagGroup> {
    let mut groups: Vec<FlagGroup> = Vec::new();

    for arg in args {
        if arg.starts_with("--") {
            groups.push(FlagGroup {
                flag: arg.clone(),
                values: Vec::new(),
            });
            continue;
        }

        match groups.last_mut() {
            Some(group) => group.values.push(arg.clone()),
            None => groups.push(FlagGroup {
                flag: POSITIONAL_KEY.to_string(),
                values: vec![arg.clone()],
            }),
        }
    }

    groups
}

/// 동적 맵에 저장할 플래그 이름 (앞쪽 대시 제거, 하이픈은 밑줄로)
pub fn dynamic_key(flag: &str) -> String {
    flag.trim_start_matches('-').replace('-', "_")
}

/// 해석이 끝난 실행 설정
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// 입력 파일 글로브 패턴
    pub input_pattern: String,
    /// 결과를 쓸 폴더
    pub output_dir: PathBuf,
    /// 각 파일에서 읽을 지표 키
    pub metric_key: String,
    /// 집계 모드
    pub aggregation: Aggregation,
    /// 디버그 출력 여부
    pub debug: bool,
    /// 결과 키 접두사 (빈 문자열이면 적용 안 함)
    pub prefix: String,
    /// 호환용 collector 값 (저장만 함)
    pub collector: Option<String>,
    /// 반복 가능한 extra 값
    pub extra: Vec<String>,
    /// 실행 이름
    pub name: Option<String>,
    /// 알 수 없는 플래그와 값 (입력 순서 유지)
    pub dynamic_args: IndexMap<String, Vec<String>>,
    /// 무시된 --aggregation 값 (로거 초기화 후 보고)
    pub ignored_aggregations: Vec<String>,
}

impl Config {
    /// 프로그램 이름을 제외한 인자 벡터로부터 설정 생성
    ///
    /// `--output_dir`이 없거나 비어 있으면 [`CollectorError::MissingOutputDir`]를 반환합니다.
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut input_pattern = DEFAULT_INPUT_PATTERN.to_string();
        let mut output_dir: Option<String> = None;
        let mut metric_key = DEFAULT_METRIC_KEY.to_string();
        let mut aggregation = Aggregation::default();
        let mut debug = false;
        let mut prefix = String::new();
        let mut collector = None;
        let mut extra = Vec::new();
        let mut name = None;
        let mut dynamic_args: IndexMap<String, Vec<String>> = IndexMap::new();
        let mut ignored_aggregations = Vec::new();

        for group in group_flags(args) {
            let first = group.values.first().cloned();

            match group.flag.as_str() {
                "--input-pattern" => {
                    if let Some(value) = first {
                        input_pattern = value;
                    }
                }
                "--output_dir" => output_dir = first,
                "--metric-key" => {
                    if let Some(value) = first {
                        metric_key = value;
                    }
                }
                "--aggregation" => match first.as_deref().and_then(Aggregation::parse) {
                    Some(mode) => aggregation = mode,
                    None => ignored_aggregations.extend(first),
                },
                "--debug" => debug = true,
                "--prefix" => prefix = first.unwrap_or_default(),
                "--collector" => collector = first,
                "--extra" => extra.extend(group.values),
                "--name" => name = first,
                flag => dynamic_args
                    .entry(dynamic_key(flag))
                    .or_default()
                    .extend(group.values),
            }
        }

        let output_dir = match output_dir {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => return Err(CollectorError::MissingOutputDir),
        };

        Ok(Self {
            input_pattern,
            output_dir,
            metric_key,
            aggregation,
            debug,
            prefix,
            collector,
            extra,
            name,
            dynamic_args,
            ignored_aggregations,
        })
    }
}

/// 사용법 출력용 clap 명령 정의
///
/// 인자 해석 자체는 [`Config::from_args`]가 담당하고, 이 정의는 사용 오류를
/// clap 형식으로 보고할 때 쓰입니다.
pub fn command() -> Command {
    Command::new("metric-collector")
        .version(env!("CARGO_PKG_VERSION"))
        .about("METRIC COLLECTOR - glob 패턴으로 찾은 JSON 결과 파일의 지표를 집계하는 CLI 도구")
        .override_usage(
            "metric-collector --output_dir <DIR> [--input-pattern <GLOB>] [--metric-key <KEY>] \
             [--aggregation <avg|max|min|sum|all>] [--prefix <PREFIX>] [--debug] [--FLAG <VALUE>...]",
        )
        .long_about(
            r#"
METRIC COLLECTOR
================

glob 패턴과 일치하는 JSON 결과 파일에서 지표 하나를 읽어
평균/최대/최소/합계를 계산하고 <DIR>/metrics.json 에 저장합니다.
호출 정보는 <DIR>/cli.txt 에 기록됩니다.

예제:
  metric-collector --output_dir out
  metric-collector --input-pattern "runs/**/*_data.json" --output_dir out --aggregation avg
  metric-collector --output_dir out --metric-key score --prefix test --debug
"#,
        )
}
