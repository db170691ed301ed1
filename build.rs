//! 빌드에 사용된 rustc 버전을 `METRIC_COLLECTOR_RUSTC_VERSION` 환경 변수로 노출합니다.

fn main() {
    let version = rustc_version::version_meta()
        .map(|meta| meta.short_version_string)
        .unwrap_or_else(|e| {
            println!("cargo:warning=rustc 버전을 확인할 수 없습니다: {e}");
            "rustc (unknown)".to_string()
        });

    println!("cargo:rustc-env=METRIC_COLLECTOR_RUSTC_VERSION={version}");
    println!("cargo:rerun-if-changed=build.rs");
}
