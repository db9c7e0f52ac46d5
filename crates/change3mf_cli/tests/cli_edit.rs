use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::{Value, json};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

const SETTINGS_MEMBER: &str = "Metadata/project_settings.config";
const MODEL_SETTINGS_MEMBER: &str = "Metadata/model_settings.config";
const MODEL_SETTINGS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<config>
  <object id="2">
    <metadata key="name" value="Cube"/>
  </object>
</config>
"#;

fn settings_json() -> Value {
    json!({
        "printer_model": "Bambu Lab X1 Carbon",
        "printer_settings_id": "X1C 0.4",
        "filament_settings_id": ["PLA", "PLA"]
    })
}

fn write_fixture(dir: &TempDir, file_name: &str, with_model_settings: bool) -> PathBuf {
    let path = dir.path().join(file_name);
    let mut writer = ZipWriter::new(File::create(&path).expect("create fixture"));
    let options = SimpleFileOptions::default();

    writer
        .start_file("3D/3dmodel.model", options)
        .expect("start model");
    writer.write_all(b"<model/>").expect("write model");
    writer.start_file(SETTINGS_MEMBER, options).expect("start settings");
    writer
        .write_all(&serde_json::to_vec_pretty(&settings_json()).expect("serialize"))
        .expect("write settings");
    if with_model_settings {
        writer
            .start_file(MODEL_SETTINGS_MEMBER, options)
            .expect("start model settings");
        writer
            .write_all(MODEL_SETTINGS.as_bytes())
            .expect("write model settings");
    }
    writer.finish().expect("finish fixture");
    path
}

fn member_text(path: &Path, name: &str) -> String {
    let mut archive = ZipArchive::new(File::open(path).expect("open archive")).expect("zip");
    let mut text = String::new();
    archive
        .by_name(name)
        .expect("member present")
        .read_to_string(&mut text)
        .expect("utf-8 member");
    text
}

fn read_settings(path: &Path) -> Value {
    serde_json::from_str(&member_text(path, SETTINGS_MEMBER)).expect("settings are JSON")
}

fn run_cli(path: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_change3mf"))
        .arg(path)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run change3mf CLI")
}

#[test]
fn show_prints_the_full_settings_document() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_fixture(&dir, "cube.3mf", true);

    let output = run_cli(&path, &["--show"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let shown: Value = serde_json::from_str(&stdout).expect("show prints JSON");
    assert_eq!(shown, settings_json());
}

#[test]
fn show_element_prints_one_field() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_fixture(&dir, "cube.3mf", true);

    let output = run_cli(&path, &["--show", "--element", "printer_model"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "printer_model: Bambu Lab X1 Carbon");

    let output = run_cli(&path, &["--show", "--element", "nozzle_diameter"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "nozzle_diameter not found in config.");
}

#[test]
fn show_does_not_rewrite_or_back_up() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_fixture(&dir, "cube.3mf", false);
    let original = fs::read(&path).expect("read fixture");

    let output = run_cli(&path, &["--show"]);
    assert!(output.status.success());
    assert_eq!(fs::read(&path).expect("read fixture"), original);
    assert!(!dir.path().join("cube.3mf.bak").exists());
}

#[test]
fn modifications_are_written_and_logged() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_fixture(&dir, "benchy.3mf", true);

    let output = run_cli(
        &path,
        &[
            "--modifications",
            r#"printer_model=My Printer,filament_settings_id=["PETG","ABS"],brand_new=1"#,
            "--log",
        ],
    );
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Changes saved to: "));
    assert!(stdout.contains(" - printer_model: Bambu Lab X1 Carbon → My Printer"));
    assert!(stdout.contains(r#" - filament_settings_id: ["PLA","PLA"] → ["PETG","ABS"]"#));
    assert!(stdout.contains(" - brand_new: <not set> → 1"));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("key 'brand_new' not found in config"));

    let settings = read_settings(&path);
    assert_eq!(settings["printer_model"], json!("My Printer"));
    assert_eq!(settings["filament_settings_id"], json!(["PETG", "ABS"]));
    assert_eq!(settings["brand_new"], json!("1"));
    assert_eq!(settings["printer_settings_id"], json!("X1C 0.4"));

    let model_settings = member_text(&path, MODEL_SETTINGS_MEMBER);
    assert!(model_settings.contains(r#"value="benchy""#));
    assert!(!model_settings.contains(r#"value="Cube""#));
}

#[test]
fn default_run_keeps_a_verbatim_backup() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_fixture(&dir, "cube.3mf", true);
    let original = fs::read(&path).expect("read fixture");

    let output = run_cli(&path, &["--modifications", "printer_model=P1S"]);
    assert!(output.status.success());

    let backup = dir.path().join("cube.3mf.bak");
    assert_eq!(fs::read(&backup).expect("backup exists"), original);
    assert!(String::from_utf8_lossy(&output.stdout).contains("Backup saved as: "));
    assert!(!dir.path().join("cube.3mf.tmp").exists());
}

#[test]
fn nobackup_and_nonamechange_skip_side_files_and_rename() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_fixture(&dir, "cube.3mf", true);

    let output = run_cli(
        &path,
        &[
            "--modifications",
            "printer_model=P1S",
            "--nobackup",
            "--nonamechange",
        ],
    );
    assert!(output.status.success());

    assert!(!dir.path().join("cube.3mf.bak").exists());
    assert_eq!(member_text(&path, MODEL_SETTINGS_MEMBER), MODEL_SETTINGS);
    assert_eq!(read_settings(&path)["printer_model"], json!("P1S"));
}

#[test]
fn config_from_file_applies_json_values_verbatim() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_fixture(&dir, "cube.3mf", true);
    let mods = dir.path().join("mods.json");
    fs::write(&mods, r#"{"printer_model": "A1", "wall_loops": 3}"#).expect("write mods");

    let output = run_cli(
        &path,
        &["--config-from-file", &mods.to_string_lossy(), "--nobackup"],
    );
    assert!(output.status.success());

    let settings = read_settings(&path);
    assert_eq!(settings["printer_model"], json!("A1"));
    assert_eq!(settings["wall_loops"], json!(3));
}

#[test]
fn malformed_inline_pair_fails_before_any_write() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_fixture(&dir, "cube.3mf", true);
    let original = fs::read(&path).expect("read fixture");

    let output = run_cli(&path, &["--modifications", "a=1,bad"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: FormatError: invalid format in modification: bad"));
    assert_eq!(fs::read(&path).expect("read fixture"), original);
    assert!(!dir.path().join("cube.3mf.bak").exists());
}

#[test]
fn missing_settings_member_reports_not_found() {
    let dir = TempDir::new().expect("temp dir");
    let path = dir.path().join("empty.3mf");
    let mut writer = ZipWriter::new(File::create(&path).expect("create fixture"));
    writer
        .start_file("3D/3dmodel.model", SimpleFileOptions::default())
        .expect("start model");
    writer.write_all(b"<model/>").expect("write model");
    writer.finish().expect("finish fixture");

    let output = run_cli(&path, &["--modifications", "a=1"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: NotFound: Metadata/project_settings.config not found"));
    assert!(!dir.path().join("empty.3mf.bak").exists());
}

#[test]
fn writing_requires_exactly_one_modification_source() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_fixture(&dir, "cube.3mf", true);

    let output = run_cli(&path, &[]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error: UsageError: "));

    let output = run_cli(
        &path,
        &[
            "--modifications",
            "a=1",
            "--config-from-file",
            "mods.json",
        ],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error: UsageError: "));
    assert!(!dir.path().join("cube.3mf.bak").exists());
}

#[test]
fn blank_inline_modifications_are_a_usage_error() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_fixture(&dir, "cube.3mf", true);
    let original = fs::read(&path).expect("read fixture");

    let output = run_cli(&path, &["--modifications", ""]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: UsageError: "));
    assert!(!stderr.contains("FormatError"));
    assert_eq!(fs::read(&path).expect("read fixture"), original);
    assert!(!dir.path().join("cube.3mf.bak").exists());
}

#[test]
fn empty_modification_file_warns_and_keeps_settings() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_fixture(&dir, "cube.3mf", true);
    let mods = dir.path().join("mods.json");
    fs::write(&mods, "{}").expect("write modifications");

    let output = run_cli(
        &path,
        &["--config-from-file", &mods.to_string_lossy(), "--nobackup"],
    );
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no modifications given"));
    assert_eq!(read_settings(&path), settings_json());
}
