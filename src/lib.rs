//! metric-collector - METRIC COLLECTOR
//!
//! glob 패턴과 일치하는 JSON 결과 파일에서 지표 하나를 읽어 요약 통계를 계산하는
//! 단일 실행 배치 도구입니다.
//!
//! # 처리 단계
//!
//! 1. [`cli`]: 인자 벡터를 [`Config`]로 해석 (알 수 없는 플래그는 동적 맵에 보관)
//! 2. [`discovery`]: `**` 재귀를 지원하는 글로브로 일반 파일 목록 생성
//! 3. [`extractor`]: 파일마다 지표 값을 꺼내고, 실패는 NA 레코드로 처리
//! 4. [`stats`]: 평균/최대/최소/합계 집계
//! 5. [`writer`]: `metrics.json`과 `cli.txt` 저장
//!
//! # 예제
//!
//! ```bash
//! # 기본 사용법 (**/*_data.json 의 "result" 키)
//! metric-collector --output_dir out
//!
//! # 평균만, 키 접두사 적용
//! metric-collector --input-pattern "runs/**/*_data.json" --output_dir out --aggregation avg --prefix test
//! ```

pub mod cli;
pub mod discovery;
pub mod error;
pub mod extractor;
pub mod stats;
pub mod writer;

// Re-exports for convenient access
pub use cli::{Aggregation, Config};
pub use discovery::find_data_files;
pub use error::{CollectorError, Result};
pub use extractor::{collect_records, load_record, Extracted, ExtractedRecord, NaReason};
pub use stats::{aggregate, Aggregate, Summary};
pub use writer::{build_result, RunContext};
