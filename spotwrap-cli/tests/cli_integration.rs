use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use std::error::Error;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

// Helper function to get the path to the compiled binary with a clean
// environment for the variables clap reads.
fn spotwrap_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("spotwrap").expect("Failed to find spotwrap binary");
    cmd.current_dir(dir)
        .env_remove("SPOTWRAP_SPOTDL")
        .env_remove("SPOTWRAP_OUTPUT_DIR")
        .env_remove("SPOTWRAP_LOG")
        .env("NO_COLOR", "1");
    cmd
}

#[cfg(unix)]
fn fake_spotdl(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-spotdl");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

#[test]
fn test_dry_run_prints_command() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    spotwrap_cmd(dir.path())
        .args(["download", "https://open.spotify.com/track/abc", "-o", "music", "--dry-run"])
        .assert()
        .success()
        .stdout(
            "spotdl download --output music --format mp3 --bitrate 0 --threads 4 \
             --skip-existing --lyrics --embed-metadata https://open.spotify.com/track/abc\n",
        );
    // Nothing is created for a dry run
    assert!(!dir.path().join("music").exists());
    Ok(())
}

#[test]
fn test_dry_run_json_keeps_tokens_separate() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let output = spotwrap_cmd(dir.path())
        .args([
            "--json",
            "url",
            "https://open.spotify.com/track/abc",
            "--extra-args",
            "--ffmpeg-args '-vn -sn'",
            "--dry-run",
        ])
        .output()?;
    assert!(output.status.success());

    let tokens: Vec<String> = serde_json::from_slice(&output.stdout)?;
    assert_eq!(tokens[0], "spotdl");
    assert_eq!(tokens[1], "url");
    assert!(!tokens.iter().any(|t| t == "--format"));
    assert_eq!(
        &tokens[tokens.len() - 3..],
        &["--ffmpeg-args", "-vn -sn", "https://open.spotify.com/track/abc"]
    );
    Ok(())
}

#[test]
fn test_save_without_save_file_is_a_usage_error() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    spotwrap_cmd(dir.path())
        .args(["save", "https://open.spotify.com/album/a", "--dry-run"])
        .assert()
        .code(2)
        .stderr(contains("Error:"));
    Ok(())
}

#[test]
fn test_malformed_extra_args_are_rejected() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    spotwrap_cmd(dir.path())
        .args(["download", "https://open.spotify.com/track/abc", "--extra-args", "\"unclosed"])
        .assert()
        .code(2)
        .stderr(contains("check the quoting"));
    Ok(())
}

#[test]
fn test_search_query_needs_single_target() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    spotwrap_cmd(dir.path())
        .args(["download", "https://a", "https://b", "--search-query", "artist - title", "--dry-run"])
        .assert()
        .code(2);
    Ok(())
}

#[test]
fn test_zero_threads_rejected_by_parser() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    spotwrap_cmd(dir.path())
        .args(["download", "https://a", "--threads", "0"])
        .assert()
        .code(2);
    Ok(())
}

#[test]
fn test_missing_spotdl_exits_127() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    spotwrap_cmd(dir.path())
        .args(["--spotdl", "/definitely/not/here/spotdl", "url", "https://open.spotify.com/track/abc"])
        .assert()
        .code(127)
        .stderr(contains("could not start spotDL"));
    Ok(())
}

#[test]
fn test_check_reports_missing_spotdl() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    spotwrap_cmd(dir.path())
        .args(["--spotdl", "/definitely/not/here/spotdl", "check"])
        .assert()
        .code(1)
        .stdout(contains("pip install spotdl"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_run_streams_output_and_creates_output_dir() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let tool = fake_spotdl(
        dir.path(),
        "echo \"Processing $#\"\necho 'Could not find a match for: Artist - Missing'\nexit 0",
    );
    spotwrap_cmd(dir.path())
        .arg("--spotdl")
        .arg(&tool)
        .args(["download", "https://open.spotify.com/track/abc", "-o", "songs"])
        .assert()
        .success()
        .stdout(contains("Processing 13"))
        .stdout(contains("Skipped/Failed Downloads"))
        .stdout(contains("- Artist - Missing"));
    assert!(dir.path().join("songs").is_dir());
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_exit_code_passes_through() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let tool = fake_spotdl(dir.path(), "echo 'Traceback' >&2\nexit 7");
    spotwrap_cmd(dir.path())
        .arg("--spotdl")
        .arg(&tool)
        .args(["url", "https://open.spotify.com/track/abc"])
        .assert()
        .code(7)
        .stderr(contains("exit code 7"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_json_result() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let tool = fake_spotdl(dir.path(), "echo first\necho second >&2\nexit 3");
    let output = spotwrap_cmd(dir.path())
        .arg("--spotdl")
        .arg(&tool)
        .args(["--json", "url", "https://open.spotify.com/track/abc"])
        .output()?;
    assert_eq!(output.status.code(), Some(3));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value["operation"], "get-urls");
    assert_eq!(value["classification"]["kind"], "non-zero-exit");
    assert_eq!(value["classification"]["detail"], 3);
    let texts: Vec<&str> = value["transcript"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|line| line["text"].as_str())
        .collect();
    assert!(texts.contains(&"first"));
    assert!(texts.contains(&"second"));
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_log_dir_receives_transcript() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let tool = fake_spotdl(dir.path(), "printf '\\033[32mDownloaded\\033[0m \"A - B\"\\n'");
    spotwrap_cmd(dir.path())
        .arg("--spotdl")
        .arg(&tool)
        .args(["--log-dir", "logs", "url", "https://open.spotify.com/track/abc"])
        .assert()
        .success();

    let logs: Vec<PathBuf> = std::fs::read_dir(dir.path().join("logs"))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    assert_eq!(logs.len(), 1);
    let name = logs[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("spotwrap_url_"));

    let text = std::fs::read_to_string(&logs[0])?;
    assert!(text.contains("Downloaded \"A - B\""));
    assert!(!text.contains('\u{1b}'));
    assert!(predicate::str::contains("Command:").eval(&text));
    Ok(())
}

#[test]
fn test_menu_exits_on_end_of_input() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    spotwrap_cmd(dir.path())
        .args(["--spotdl", "/definitely/not/here/spotdl"])
        .write_stdin("9\n5\n")
        .assert()
        .success()
        .stdout(contains("Invalid choice. Please enter a number from the menu (1-5)."))
        .stdout(contains("Goodbye!"));
    Ok(())
}
