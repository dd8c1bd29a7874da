use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn combined_output(output: &std::process::Output) -> String {
    format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

fn write_asset(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create asset dir");
    }
    fs::write(path, b"GIF89a\x01\x00\x01\x00").expect("write asset");
}

fn gif_manifest() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("gif-manifest"));
    cmd.env_remove("GIFS_BASE_URL");
    cmd
}

fn run(root: &Path, output: &Path, extra: &[&str]) -> std::process::Output {
    gif_manifest()
        .arg("--root")
        .arg(root)
        .arg("--output")
        .arg(output)
        .arg("--progress")
        .arg("plain")
        .args(extra)
        .output()
        .expect("gif-manifest runs")
}

fn read_manifest(path: &Path) -> Vec<Value> {
    let text = fs::read_to_string(path).expect("manifest exists");
    match serde_json::from_str(&text).expect("manifest is valid json") {
        Value::Array(items) => items,
        other => panic!("manifest is not an array: {other}"),
    }
}

/// Fixture mirroring a typical `public/gifs` folder.
fn sample_tree(tmp: &TempDir) -> std::path::PathBuf {
    let root = tmp.path().join("public/gifs");
    write_asset(&root.join("intro/Pull Up.gif"));
    write_asset(&root.join("intro/.cache.gif"));
    write_asset(&root.join("intro/note.txt"));
    write_asset(&root.join("warmup.gif"));
    write_asset(&root.join("pernas/agachamento_sumo.WEBP"));
    write_asset(&root.join("pernas/a.gif"));
    write_asset(&root.join("pernas/a_1.gif"));
    write_asset(&root.join("peito/A.apng"));
    root
}

#[test]
fn help_lists_all_flags() {
    let output = gif_manifest()
        .arg("--help")
        .output()
        .expect("--help runs");
    assert!(output.status.success());

    let text = combined_output(&output);
    for flag in [
        "--root",
        "--output",
        "--base-url",
        "--ext",
        "--default-group",
        "--fallback-id",
        "--progress",
    ] {
        assert!(text.contains(flag), "help text missing {flag}: {text}");
    }
}

#[test]
fn writes_expected_entries_in_path_order() {
    let tmp = TempDir::new().expect("tempdir");
    let root = sample_tree(&tmp);
    let out = tmp.path().join("public/gifs/manifest.json");

    let output = run(&root, &out, &[]);
    assert!(output.status.success(), "{}", combined_output(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Manifest written to") && stdout.contains("with 6 entries"),
        "missing summary line: {stdout}"
    );

    let entries = read_manifest(&out);
    let files: Vec<&str> = entries.iter().map(|e| e["file"].as_str().unwrap()).collect();
    assert_eq!(
        files,
        vec![
            "intro/Pull%20Up.gif",
            "peito/A.apng",
            "pernas/a.gif",
            "pernas/a_1.gif",
            "pernas/agachamento_sumo.WEBP",
            "warmup.gif",
        ]
    );

    let ids: Vec<&str> = entries.iter().map(|e| e["id"].as_str().unwrap()).collect();
    assert_eq!(
        ids,
        vec!["pull-up", "a", "a-2", "a-1", "agachamento-sumo", "warmup"]
    );

    assert_eq!(entries[0]["name"], "Pull Up");
    assert_eq!(entries[0]["group"], "Intro");
    assert_eq!(entries[4]["name"], "Agachamento Sumo");
    assert_eq!(entries[4]["group"], "Pernas");
    assert_eq!(entries[5]["group"], "Geral");

    for entry in &entries {
        let obj = entry.as_object().expect("entry is an object");
        let mut keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        keys.sort();
        assert_eq!(keys, vec!["file", "group", "id", "name"]);
    }
}

#[test]
fn base_url_prefixes_file_field() {
    let tmp = TempDir::new().expect("tempdir");
    let root = sample_tree(&tmp);
    let out = tmp.path().join("manifest.json");

    let output = run(&root, &out, &["--base-url", "https://cdn.example.com/gifs/"]);
    assert!(output.status.success(), "{}", combined_output(&output));

    let entries = read_manifest(&out);
    assert_eq!(
        entries[0]["file"],
        "https://cdn.example.com/gifs/intro/Pull%20Up.gif"
    );
    assert_eq!(entries[5]["file"], "https://cdn.example.com/gifs/warmup.gif");
}

#[test]
fn base_url_is_read_from_environment() {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path().join("gifs");
    write_asset(&root.join("warmup.gif"));
    let out = tmp.path().join("manifest.json");

    let output = gif_manifest()
        .env("GIFS_BASE_URL", "/static/gifs")
        .arg("--root")
        .arg(&root)
        .arg("--output")
        .arg(&out)
        .arg("--progress")
        .arg("quiet")
        .output()
        .expect("gif-manifest runs");
    assert!(output.status.success(), "{}", combined_output(&output));

    let entries = read_manifest(&out);
    assert_eq!(entries[0]["file"], "/static/gifs/warmup.gif");
}

#[test]
fn reruns_are_byte_identical() {
    let tmp = TempDir::new().expect("tempdir");
    let root = sample_tree(&tmp);
    let first = tmp.path().join("first/manifest.json");
    let second = tmp.path().join("second/manifest.json");

    assert!(run(&root, &first, &["--base-url", "https://x.test"]).status.success());
    assert!(run(&root, &second, &["--base-url", "https://x.test"]).status.success());

    let a = fs::read(&first).expect("first manifest");
    let b = fs::read(&second).expect("second manifest");
    assert_eq!(a, b);
}

#[test]
fn output_is_pretty_utf8_without_escapes() {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path().join("gifs");
    write_asset(&root.join("costas/remada_unilateral_ção.gif"));
    let out = tmp.path().join("manifest.json");

    let output = run(&root, &out, &[]);
    assert!(output.status.success(), "{}", combined_output(&output));

    let text = fs::read_to_string(&out).expect("manifest exists");
    assert_eq!(
        text,
        "[\n  {\n    \"id\": \"remada-unilateral-o\",\n    \"name\": \"Remada Unilateral Ção\",\n    \"group\": \"Costas\",\n    \"file\": \"costas/remada_unilateral_%C3%A7%C3%A3o.gif\"\n  }\n]"
    );
}

#[test]
fn custom_extensions_and_labels() {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path().join("gifs");
    write_asset(&root.join("!!!.png"));
    write_asset(&root.join("skip.gif"));
    let out = tmp.path().join("manifest.json");

    let output = run(
        &root,
        &out,
        &[
            "--ext",
            ".PNG",
            "--default-group",
            "General",
            "--fallback-id",
            "Exercise",
        ],
    );
    assert!(output.status.success(), "{}", combined_output(&output));

    let entries = read_manifest(&out);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"], "exercise");
    assert_eq!(entries[0]["name"], "!!!");
    assert_eq!(entries[0]["group"], "General");
    assert_eq!(entries[0]["file"], "%21%21%21.png");
}

#[test]
fn missing_root_fails_without_writing() {
    let tmp = TempDir::new().expect("tempdir");
    let out = tmp.path().join("out/manifest.json");

    let output = run(&tmp.path().join("does-not-exist"), &out, &[]);
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(text.contains("scan root not found"), "missing error: {text}");
    assert!(!out.exists());
    assert!(!tmp.path().join("out").exists());
}

#[test]
fn empty_root_fails_without_writing() {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path().join("gifs");
    write_asset(&root.join(".hidden.gif"));
    write_asset(&root.join("readme.txt"));
    let out = tmp.path().join("manifest.json");

    let output = run(&root, &out, &[]);
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(text.contains("no .apng/.gif/.webp files found"), "missing error: {text}");
    assert!(!out.exists());
}

#[test]
fn existing_manifest_is_left_alone_on_failure() {
    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path().join("gifs");
    fs::create_dir_all(&root).expect("create root");
    let out = tmp.path().join("manifest.json");
    fs::write(&out, "[]").expect("seed manifest");

    let output = run(&root, &out, &[]);
    assert!(!output.status.success());
    assert_eq!(fs::read_to_string(&out).expect("still there"), "[]");
}

#[test]
fn plain_progress_reports_stages() {
    let tmp = TempDir::new().expect("tempdir");
    let root = sample_tree(&tmp);
    let out = tmp.path().join("manifest.json");

    let output = run(&root, &out, &[]);
    assert!(output.status.success(), "{}", combined_output(&output));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("[PROGRESS] manifest"), "missing progress: {stderr}");
    assert!(stderr.contains("stage=scan"), "missing scan stage: {stderr}");
    assert!(stderr.contains("[DONE] manifest: 6 entries"), "missing done line: {stderr}");
}

#[cfg(unix)]
#[test]
fn non_utf8_file_name_is_kept_and_warned_about() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let tmp = TempDir::new().expect("tempdir");
    let root = tmp.path().join("gifs");
    write_asset(&root.join("ok.gif"));
    write_asset(&root.join(OsStr::from_bytes(b"bad\xff.gif")));
    let out = tmp.path().join("manifest.json");

    let output = run(&root, &out, &[]);
    assert!(output.status.success(), "{}", combined_output(&output));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("with 2 entries"), "missing summary line: {stdout}");
    assert!(stdout.contains("warning:"), "missing warning: {stdout}");
    assert!(stdout.contains("not valid UTF-8"), "missing warning detail: {stdout}");

    let entries = read_manifest(&out);
    assert_eq!(entries[0]["id"], "bad");
    assert_eq!(entries[0]["name"], "Bad\u{FFFD}");
    assert_eq!(entries[0]["file"], "bad%EF%BF%BD.gif");
    assert_eq!(entries[1]["id"], "ok");
}
