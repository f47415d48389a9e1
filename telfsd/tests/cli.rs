use std::process::{Command, Stdio};

fn telfsd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_telfsd"))
}

#[test]
fn help_prints_usage_and_exits() {
    let out = telfsd().arg("--help").stdout(Stdio::null()).output().expect("run telfsd");
    assert!(out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.starts_with("usage: telfsd"), "{stderr}");
}

#[test]
fn unknown_flag_fails() {
    let out = telfsd().arg("--bogus").output().expect("run telfsd");
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("unknown arg: --bogus"));
}

#[test]
fn missing_root_fails_before_listening() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = telfsd()
        .args(["--port", "0", "--root"])
        .arg(dir.path().join("absent"))
        .output()
        .expect("run telfsd");
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("is not usable"));
}
