use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn packager() -> Command {
    Command::cargo_bin("app_packager").unwrap()
}

#[test]
fn test_help() {
    packager()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--app-image-only"));
}

#[test]
fn test_missing_descriptor() {
    let tmp = TempDir::new().unwrap();
    packager()
        .arg(tmp.path().join("packager.toml"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to load packaging descriptor"));
}

#[test]
fn test_unknown_installer_type() {
    packager()
        .args(["packager.toml", "--type", "zip"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown installer type"));
}

#[test]
fn test_package_without_type() {
    let tmp = TempDir::new().unwrap();
    let descriptor = tmp.path().join("packager.toml");
    fs::write(
        &descriptor,
        "[application]\nname = \"Foo\"\n\n[package]\napp_image = \"image\"\n",
    )
    .unwrap();

    packager()
        .arg(&descriptor)
        .arg("--build-root")
        .arg(tmp.path().join("build"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no installer type configured"));
}

#[cfg(target_os = "linux")]
#[test]
fn test_app_image_only() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("input")).unwrap();
    fs::write(tmp.path().join("input/app.jar"), "jar").unwrap();
    let descriptor = tmp.path().join("packager.toml");
    fs::write(
        &descriptor,
        r#"
[application]
name = "Foo"
version = "1.2"
input = "input"

[[launcher]]
name = "Foo"
module = "m"
main_class = "m.Main"

[build]
root = "build"
output = "out"
"#,
    )
    .unwrap();

    packager()
        .arg(&descriptor)
        .arg("--app-image-only")
        .assert()
        .success()
        .stdout(predicate::str::contains("App image created"));

    let app_dir = tmp.path().join("out/Foo/lib/app");
    assert!(app_dir.join("app.jar").is_file());
    let cfg = fs::read_to_string(app_dir.join("Foo.cfg")).unwrap();
    assert!(cfg.contains("app.mainmodule=m/m.Main"));
    assert!(app_dir.join(".jpackage.xml").is_file());
}

#[cfg(target_os = "linux")]
#[test]
fn test_package_keeps_staged_image() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("jdk/bin")).unwrap();
    fs::write(tmp.path().join("jdk/bin/java"), "java").unwrap();
    let descriptor = tmp.path().join("packager.toml");
    fs::write(
        &descriptor,
        r#"
[application]
name = "Foo"

[[launcher]]
name = "Foo"
module = "m"
main_class = "m.Main"

[runtime]
predefined = "jdk"

[package]
type = "deb"

[build]
root = "build"
output = "out"
"#,
    )
    .unwrap();

    packager()
        .arg(&descriptor)
        .assert()
        .success()
        .stdout(predicate::str::contains("staged image kept in"))
        .stdout(predicate::str::contains("No installer backend is attached"));

    let staged = tmp.path().join("build/image/opt/Foo");
    assert!(staged.join("lib/runtime/bin/java").is_file());
    assert!(staged.join("lib/app/.package").is_file());
    assert!(!tmp.path().join("out").exists());
}
