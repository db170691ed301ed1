//! metric-collector - METRIC COLLECTOR
//!
//! 메인 엔트리포인트

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressIterator, ProgressStyle};
use log::LevelFilter;
use std::process::ExitCode;

use metric_collector::{
    aggregate, cli, collect_records, find_data_files, writer, Config, ExtractedRecord, RunContext,
};

/// 파일을 하나도 찾지 못함
const EXIT_NO_FILES_FOUND: u8 = 1;
/// 결과 파일을 쓰지 못하는 등 예기치 못한 실패 (사용 오류는 clap이 2로 종료)
const EXIT_INTERNAL_ERROR: u8 = 3;

fn main() -> ExitCode {
    let argv: Vec<String> = std::env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    // 출력 폴더가 없으면 어떤 파일도 건드리기 전에 사용 오류로 종료
    let config = match Config::from_args(argv.get(1..).unwrap_or_default()) {
        Ok(config) => config,
        Err(e) => cli::command()
            .error(ErrorKind::MissingRequiredArgument, e)
            .exit(),
    };

    init_logging(config.debug);

    for value in &config.ignored_aggregations {
        log::debug!("Ignoring unsupported aggregation value {value:?}");
    }

    let ctx = RunContext::capture(argv);

    match run(&config, &ctx) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "❌".bright_red(), e);
            ExitCode::from(EXIT_INTERNAL_ERROR)
        }
    }
}

/// 로거 초기화 (환경 변수는 읽지 않음)
fn init_logging(debug: bool) {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();
}

/// 수집 실행
fn run(config: &Config, ctx: &RunContext) -> Result<ExitCode> {
    let output_dir = &config.output_dir;

    writer::prepare_output_dir(output_dir).context("출력 폴더 준비 실패")?;

    let cli_path =
        writer::write_cli_debug(output_dir, config, ctx).context("CLI 디버그 정보 저장 실패")?;
    println!(
        "{} CLI 디버그 정보 저장: {}",
        "📝".bright_cyan(),
        cli_path.display()
    );

    if config.debug {
        print_header(config, ctx);
    }

    let data_files = find_data_files(&config.input_pattern);

    if data_files.is_empty() {
        let result = writer::no_files_result(&config.input_pattern, ctx);
        let metrics_path =
            writer::write_metrics(output_dir, &result).context("에러 결과 저장 실패")?;

        println!(
            "{} 데이터 파일을 찾지 못했습니다. 에러 결과 저장: {}",
            "⚠️".bright_yellow(),
            metrics_path.display()
        );
        return Ok(ExitCode::from(EXIT_NO_FILES_FOUND));
    }

    println!(
        "{} 발견된 파일 수: {}",
        "📋".bright_white(),
        data_files.len().to_string().bright_green()
    );

    let pb = create_progress_bar(data_files.len(), config.debug);
    let records = collect_records(
        data_files.iter().progress_with(pb.clone()),
        &config.metric_key,
    );
    pb.finish_and_clear();

    let values: Vec<f64> = records.iter().filter_map(ExtractedRecord::value).collect();
    let aggregated = aggregate(&values, config.aggregation);
    let result = writer::build_result(config, &records, &aggregated);

    let metrics_path = writer::write_metrics(output_dir, &result).context("집계 결과 저장 실패")?;

    println!(
        "{} {}개 파일의 집계 결과 저장: {}",
        "✅".bright_green(),
        records.len(),
        metrics_path.display()
    );

    if config.debug {
        println!("\n{}", "=== AGGREGATION RESULT ===".bright_white().bold());
        println!("{}", serde_json::to_string_pretty(&result)?);
    }

    Ok(ExitCode::SUCCESS)
}

/// 디버그 모드 헤더 출력
fn print_header(config: &Config, ctx: &RunContext) {
    println!("\n{}", "═".repeat(50).bright_blue());
    println!("{}", " 📊 METRIC COLLECTOR".bright_white().bold());
    println!("{}", "═".repeat(50).bright_blue());
    println!(
        "  {} 입력 패턴: {}",
        "🔍".bright_magenta(),
        config.input_pattern
    );
    println!(
        "  {} 출력 폴더: {}",
        "📂".bright_cyan(),
        ctx.absolute(&config.output_dir).display()
    );
    println!("  {} 지표 키: {}", "🎯".bright_cyan(), config.metric_key);
    println!("  {} 집계: {}", "⚙️".bright_yellow(), config.aggregation);

    if !config.prefix.is_empty() {
        println!("  {} 접두사: {}", "🏷️".bright_white(), config.prefix);
    }

    println!("{}", "═".repeat(50).bright_blue());
}

/// 진행률 바 생성 (디버그 모드에서는 로그와 섞이지 않도록 숨김)
fn create_progress_bar(total: usize, hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total as u64);
    if let Ok(style) = ProgressStyle::default_bar().template(
        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
    ) {
        pb.set_style(style.progress_chars("█▓▒░"));
    }
    pb
}
