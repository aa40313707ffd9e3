//! Integration tests running the `boardfile` binary in a scratch project.

use std::path::Path;
use std::process::{Command, Output};

const BOARD: &str = r#"
name = "bench"
device = "LFE5U-25F-6BG256C"

[default-clock]
name = "clk25"
period-ns = 40.0

[[signals]]
name = "clk25"
pins = "P6"
io-standard = "LVCMOS33"
frequency-hz = 25000000

[[signals]]
name = "led"
pins = "J1:2"
io-standard = "LVCMOS33"

[[connectors]]
name = "J1"
pins = ["NC", "GND", "B2", "+3V3"]

[programmer]
kind = "custom"
template = "board={{board}}\nbitstream={{bitstream_file}}\n"
extension = "cfg"
timeout-secs = 10
values = { board = "bench" }

[programmer.tool]
program = "/bin/sh"
args = ["-c", "cat \"$1\"; exit 4", "loader", "{descriptor}"]
"#;

fn boardfile(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_boardfile"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("run boardfile")
}

fn project() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("platforms")).unwrap();
    std::fs::write(dir.path().join("platforms/bench.platform.toml"), BOARD).unwrap();
    std::fs::write(dir.path().join("boardfile.toml"), "default-platform = \"bench\"\n").unwrap();
    dir
}

#[test]
fn lists_project_platforms() {
    let dir = project();
    let out = boardfile(dir.path(), &["list"]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("ecp5-evn"));
    assert!(stdout.contains("bench"));
}

#[test]
fn default_platform_constraints() {
    let dir = project();
    let out = boardfile(dir.path(), &["constraints"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let lpf = String::from_utf8_lossy(&out.stdout);
    assert!(lpf.contains("LOCATE COMP \"led_0\" SITE \"B2\";"));
    assert!(lpf.contains("FREQUENCY PORT \"clk25_0\" 25.000 MHz;"));
}

#[test]
fn builtin_overrides_default() {
    let dir = project();
    let out = boardfile(dir.path(), &["-p", "ecp5-evn", "validate"]);
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("'ecp5-evn' is valid"));
}

#[cfg(unix)]
#[test]
fn program_reports_tool_failure() {
    let dir = project();
    let bit = dir.path().join("top.bit");
    std::fs::write(&bit, b"bits").unwrap();

    let out = boardfile(dir.path(), &["program", "top.bit"]);
    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("board=bench"));
    assert!(stdout.contains("bitstream=top.bit"));
    assert!(String::from_utf8_lossy(&out.stderr).contains("exit status: 4"));
    assert!(dir.path().join("top.cfg").is_file());
}

#[test]
fn unknown_platform_fails() {
    let dir = project();
    let out = boardfile(dir.path(), &["-p", "nope", "describe"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("unknown platform"));
}
