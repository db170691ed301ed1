//! 집계 모듈
//!
//! 유효한 지표 값 목록을 집계 모드에 따라 요약 통계로 줄입니다.

use serde_json::{json, Map, Value};
use std::cmp::Ordering;

use crate::cli::Aggregation;

/// 유효한 값이 하나도 없을 때의 에러 메시지
pub const NO_VALID_VALUES: &str = "No valid values found";

/// 요약 통계
///
/// 선택되지 않은 통계는 None이며 결과 문서에서 빠집니다.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub avg: Option<f64>,
    pub max: Option<f64>,
    pub min: Option<f64>,
    pub sum: Option<f64>,
    /// 유효한 값의 개수
    pub count: usize,
    /// 유효한 값 (탐색 순서)
    pub values: Vec<f64>,
}

/// 집계 결과
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregate {
    /// 하나 이상의 유효한 값으로 계산된 통계
    Stats(Summary),
    /// 유효한 값이 없음
    Empty,
}

impl Aggregate {
    /// 결과 문서에 병합될 키/값 맵
    ///
    /// 키 순서는 `avg`, `max`, `min`, `sum`, `count`, `values`이며
    /// 값이 없으면 `error` 키 하나만 담깁니다.
    pub fn to_json_map(&self) -> Map<String, Value> {
        let mut map = Map::new();

        match self {
            Aggregate::Empty => {
                map.insert("error".to_string(), json!(NO_VALID_VALUES));
            }
            Aggregate::Stats(summary) => {
                let stats = [
                    ("avg", summary.avg),
                    ("max", summary.max),
                    ("min", summary.min),
                    ("sum", summary.sum),
                ];
                for (key, value) in stats {
                    if let Some(value) = value {
                        map.insert(key.to_string(), json!(value));
                    }
                }
                map.insert("count".to_string(), json!(summary.count));
                map.insert("values".to_string(), json!(summary.values));
            }
        }

        map
    }
}

/// 값 목록 집계
///
/// # Arguments
/// * `values` - NA를 제외한 숫자 값 (탐색 순서)
/// * `aggregation` - 계산할 통계 선택
///
/// # Examples
/// ```
/// use metric_collector::cli::Aggregation;
/// use metric_collector::stats::{aggregate, Aggregate};
///
/// let Aggregate::Stats(summary) = aggregate(&[1.0, 2.0, 6.0], Aggregation::All) else {
///     panic!("expected stats");
/// };
/// assert_eq!(summary.avg, Some(3.0));
/// assert_eq!(summary.count, 3);
/// ```
pub fn aggregate(values: &[f64], aggregation: Aggregation) -> Aggregate {
    if values.is_empty() {
        return Aggregate::Empty;
    }

    let sum: f64 = values.iter().sum();

    let summary = Summary {
        avg: aggregation
            .includes(Aggregation::Avg)
            .then(|| sum / values.len() as f64),
        max: aggregation
            .includes(Aggregation::Max)
            .then(|| values.iter().copied().max_by(nan_last))
            .flatten(),
        min: aggregation
            .includes(Aggregation::Min)
            .then(|| values.iter().copied().min_by(nan_last))
            .flatten(),
        sum: aggregation.includes(Aggregation::Sum).then_some(sum),
        count: values.len(),
        values: values.to_vec(),
    };

    log::debug!("Aggregated {} values: {:?}", values.len(), summary);

    Aggregate::Stats(summary)
}

/// NaN을 가장 큰 값으로 보는 전순서
///
/// 최댓값은 NaN이 하나라도 있으면 NaN, 최솟값은 값이 모두 NaN일 때만 NaN입니다.
fn nan_last(a: &f64, b: &f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
    }
}
