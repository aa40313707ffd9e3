//! End-to-end programming runs against shell scripts standing in for `pgrcmd`.
#![cfg(unix)]

use std::path::Path;
use std::time::Duration;

use boardfile_platform::boards::ecp5_evn;
use boardfile_platform::{ProgrammerConfig, ToolCommand, XcfIdentity};
use boardfile_program::{adapter_for, ProgramError, Programmer, TemplateProgrammer};

fn evn_identity(script: &str, timeout_secs: u64) -> XcfIdentity {
    let Some(ProgrammerConfig::LatticeXcf(mut identity)) = ecp5_evn().unwrap().programmer().cloned()
    else {
        panic!("ecp5-evn should use an XCF programmer");
    };
    identity.tool = ToolCommand {
        program: "/bin/sh".into(),
        args: vec!["-c".into(), script.into(), "pgrcmd".into(), "{descriptor}".into()],
    };
    identity.timeout_secs = timeout_secs;
    identity
}

fn bitstream(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("top.bit");
    std::fs::write(&path, [0xffu8; 16]).unwrap();
    path
}

#[test]
fn tool_reads_written_descriptor() {
    let dir = tempfile::tempdir().unwrap();
    let bit = bitstream(dir.path());
    let mut adapter =
        TemplateProgrammer::lattice_xcf(&evn_identity("grep -c '<IDCode>0x81112043</IDCode>' \"$1\"", 10))
            .unwrap();

    let outcome = adapter.load_bitstream(&bit).unwrap();
    assert!(outcome.success(), "stderr: {}", outcome.stderr);
    assert_eq!(outcome.stdout.trim(), "1");

    let written = std::fs::read_to_string(dir.path().join("top.xcf")).unwrap();
    assert_eq!(written.matches(&*bit.display().to_string()).count(), 1);
}

#[test]
fn exit_status_surfaces_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let bit = bitstream(dir.path());
    let config = ProgrammerConfig::LatticeXcf(evn_identity(
        "echo 'Lattice Diamond Programmer'; echo 'Failed to scan chain' >&2; exit 3",
        10,
    ));
    let mut adapter = adapter_for(&config).unwrap();

    let descriptor = adapter.render(&bit).unwrap();
    let outcome = adapter.invoke(&descriptor).unwrap();
    assert_eq!(outcome.code(), Some(3));
    assert_eq!(outcome.stdout, "Lattice Diamond Programmer\n");
    assert_eq!(outcome.stderr, "Failed to scan chain\n");
}

#[test]
fn hung_tool_is_killed() {
    let dir = tempfile::tempdir().unwrap();
    let bit = bitstream(dir.path());
    let mut adapter = TemplateProgrammer::lattice_xcf(&evn_identity("exec sleep 60", 300))
        .unwrap()
        .with_timeout(Duration::from_millis(200));

    let err = adapter.load_bitstream(&bit).unwrap_err();
    assert!(matches!(err, ProgramError::Timeout { .. }), "got {err}");
}
