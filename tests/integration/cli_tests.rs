//! CLI integration tests
//!
//! These tests run the built binary against manifests written into a
//! temporary project directory.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CLEAN_MANIFEST: &str = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    package="com.example.app">
    <application>
        <activity android:name=".DeepLinkActivity">
            <intent-filter>
                <action android:name="android.intent.action.VIEW" />
                <category android:name="android.intent.category.DEFAULT" />
                <category android:name="android.intent.category.BROWSABLE" />
                <data android:scheme="myapp" android:host="open" />
            </intent-filter>
        </activity>
    </application>
</manifest>
"#;

const UPPER_CASE_SCHEME_MANIFEST: &str = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    package="com.example.app">
    <application>
        <activity android:name=".DeepLinkActivity">
            <intent-filter>
                <action android:name="android.intent.action.VIEW" />
                <category android:name="android.intent.category.DEFAULT" />
                <category android:name="android.intent.category.BROWSABLE" />
                <data android:scheme="MYAPP" android:host="open" />
            </intent-filter>
        </activity>
    </application>
</manifest>
"#;

const MISSING_AUTO_VERIFY_MANIFEST: &str = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    package="com.example.app">
    <application>
        <activity android:name=".WebActivity">
            <intent-filter>
                <action android:name="android.intent.action.VIEW" />
                <category android:name="android.intent.category.DEFAULT" />
                <category android:name="android.intent.category.BROWSABLE" />
                <data android:scheme="https" android:host="example.com" />
            </intent-filter>
        </activity>
    </application>
</manifest>
"#;

const PLACEHOLDER_HOST_MANIFEST: &str = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    package="com.example.app">
    <application>
        <activity android:name=".DeepLinkActivity">
            <intent-filter>
                <action android:name="android.intent.action.VIEW" />
                <category android:name="android.intent.category.DEFAULT" />
                <category android:name="android.intent.category.BROWSABLE" />
                <data android:scheme="myapp" android:host="${deepLinkHost}" />
            </intent-filter>
        </activity>
    </application>
</manifest>
"#;

const NO_SCHEME_MANIFEST: &str = r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android"
    xmlns:tools="http://schemas.android.com/tools"
    package="com.example.app">
    <application>
        <activity android:name=".DeepLinkActivity">
            <intent-filter>
                <data android:host="example.com" />
            </intent-filter>
            <tools:validation testUrl="https://example.com/" />
        </activity>
    </application>
</manifest>
"#;

/// Write `manifest` to `app/src/main/AndroidManifest.xml` inside a new project
fn project_with(manifest: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    write_manifest(dir.path(), "app/src/main", manifest);
    dir
}

fn write_manifest(root: &Path, relative_dir: &str, manifest: &str) {
    let dir = root.join(relative_dir);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("AndroidManifest.xml"), manifest).unwrap();
}

fn applinkcheck() -> Command {
    let mut cmd = Command::cargo_bin("applinkcheck").unwrap();
    cmd.env("NO_COLOR", "1").arg("--quiet");
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_cli_help() {
    Command::cargo_bin("applinkcheck")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("applinkcheck"))
        .stdout(predicate::str::contains("--placeholder"))
        .stdout(predicate::str::contains("--empty-scheme"));
}

#[test]
fn test_cli_version() {
    Command::cargo_bin("applinkcheck")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("applinkcheck"));
}

#[test]
fn test_missing_path_fails() {
    let dir = TempDir::new().unwrap();
    applinkcheck()
        .arg(dir.path().join("does-not-exist"))
        .assert()
        .failure();
}

#[test]
fn test_no_manifests_found() {
    let dir = TempDir::new().unwrap();
    applinkcheck()
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No AndroidManifest.xml files found."));
}

// ============================================================================
// Exit codes
// ============================================================================

#[test]
fn test_clean_project_succeeds() {
    let dir = project_with(CLEAN_MANIFEST);
    applinkcheck()
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No issues found."));
}

#[test]
fn test_errors_exit_with_one() {
    let dir = project_with(UPPER_CASE_SCHEME_MANIFEST);
    applinkcheck()
        .arg(dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "Error: Scheme matching is case sensitive and should only use lower-case characters [AppLinkUrlError]",
        ))
        .stdout(predicate::str::contains("1 errors, 0 warnings"));
}

#[test]
fn test_warnings_do_not_fail() {
    let dir = project_with(MISSING_AUTO_VERIFY_MANIFEST);
    applinkcheck()
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[AppLinkWarning]"))
        .stdout(predicate::str::contains("0 errors, 1 warnings"));
}

#[test]
fn test_unreadable_manifest_exits_with_two() {
    let dir = project_with(CLEAN_MANIFEST);
    write_manifest(dir.path(), "lib/src/main", "this is not xml");
    applinkcheck().arg(dir.path()).assert().code(2);
}

#[test]
fn test_single_manifest_file_argument() {
    let dir = project_with(UPPER_CASE_SCHEME_MANIFEST);
    applinkcheck()
        .arg(dir.path().join("app/src/main/AndroidManifest.xml"))
        .assert()
        .code(1);
}

#[test]
fn test_build_outputs_are_excluded() {
    let dir = project_with(CLEAN_MANIFEST);
    write_manifest(
        dir.path(),
        "app/build/intermediates/merged_manifest",
        UPPER_CASE_SCHEME_MANIFEST,
    );
    applinkcheck().arg(dir.path()).assert().success();
}

// ============================================================================
// Output formats
// ============================================================================

#[test]
fn test_json_output() {
    let dir = project_with(UPPER_CASE_SCHEME_MANIFEST);
    let output = applinkcheck()
        .arg(dir.path())
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["files_checked"], 1);
    assert_eq!(value["total_issues"], 1);
    assert_eq!(value["issues"][0]["id"], "AppLinkUrlError");
    assert_eq!(value["issues"][0]["severity"], "error");
    assert_eq!(value["issues"][0]["line"], 9);
    assert_eq!(value["summary"]["errors"], 1);
}

#[test]
fn test_sarif_output_to_file() {
    let dir = project_with(UPPER_CASE_SCHEME_MANIFEST);
    let report = dir.path().join("report.sarif");
    applinkcheck()
        .arg(dir.path())
        .args(["--format", "sarif", "--output"])
        .arg(&report)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("SARIF report written to"));

    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(value["version"], "2.1.0");
    assert_eq!(value["runs"][0]["results"][0]["ruleId"], "AppLinkUrlError");
    assert_eq!(value["runs"][0]["results"][0]["level"], "error");
}

// ============================================================================
// Overrides
// ============================================================================

#[test]
fn test_disable_issue() {
    let dir = project_with(UPPER_CASE_SCHEME_MANIFEST);
    applinkcheck()
        .arg(dir.path())
        .args(["--disable", "AppLinkUrlError"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No issues found."));
}

#[test]
fn test_config_file_disables_issue() {
    let dir = project_with(MISSING_AUTO_VERIFY_MANIFEST);
    fs::write(
        dir.path().join(".applinkcheck.yml"),
        "checks:\n  disabled:\n    - AppLinkWarning\n",
    )
    .unwrap();
    applinkcheck()
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("No issues found."));
}

#[test]
fn test_placeholder_values_are_checked() {
    let dir = project_with(PLACEHOLDER_HOST_MANIFEST);
    applinkcheck().arg(dir.path()).assert().success();

    applinkcheck()
        .arg(dir.path())
        .args(["--placeholder", "deepLinkHost=Example.com"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "Host matching is case sensitive and should only use lower-case characters",
        ));
}

#[test]
fn test_invalid_placeholder_argument() {
    let dir = project_with(CLEAN_MANIFEST);
    applinkcheck()
        .arg(dir.path())
        .args(["--placeholder", "novalue"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("KEY=VALUE"));
}

#[test]
fn test_empty_scheme_policy() {
    let dir = project_with(NO_SCHEME_MANIFEST);
    let unmatched = "Test URL did not match any intent filter declaring a URI";

    applinkcheck()
        .arg(dir.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains(unmatched));

    applinkcheck()
        .arg(dir.path())
        .args(["--empty-scheme", "match-any"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("At least one scheme must be specified"))
        .stdout(predicate::str::contains(unmatched).not());
}
