use std::fs;
use std::path::Path;
use std::process::{Command, Output};

//===========================================================================//

fn romdump(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_romdump"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

//===========================================================================//

#[test]
fn dump_simulated_image() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("rom.bin");
    let mut image = vec![0xffu8; 0x2000];
    image[0] = 0x00;
    fs::write(&image_path, &image).unwrap();
    let output = romdump(&["dump", "--image", path_str(&image_path)]);
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert_eq!(text.lines().count(), 513);
    assert!(text.starts_with(&format!(":1000000000{}\r\n", "FF".repeat(16))));
    assert!(text.ends_with(":00000001FF\r\n"));
}

#[test]
fn skip_blank_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("blank.bin");
    fs::write(&image_path, vec![0xffu8; 0x2000]).unwrap();
    let output =
        romdump(&["dump", "--skip-blank", "--image", path_str(&image_path)]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    let output = romdump(&["scan", "--image", path_str(&image_path)]);
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.ends_with("is blank\n"));
}

#[test]
fn skip_blank_leaves_existing_output_alone() {
    let dir = tempfile::tempdir().unwrap();
    let blank_path = dir.path().join("blank.bin");
    let full_path = dir.path().join("full.bin");
    let hex_path = dir.path().join("keep.hex");
    fs::write(&blank_path, vec![0xffu8; 0x2000]).unwrap();
    fs::write(&full_path, vec![0x00u8; 0x2000]).unwrap();
    fs::write(&hex_path, "previous dump\n").unwrap();
    let output = romdump(&[
        "dump",
        "--skip-blank",
        "--image",
        path_str(&blank_path),
        "--output",
        path_str(&hex_path),
    ]);
    assert!(output.status.success());
    assert_eq!(fs::read_to_string(&hex_path).unwrap(), "previous dump\n");

    let output = romdump(&[
        "dump",
        "--skip-blank",
        "--image",
        path_str(&full_path),
        "--output",
        path_str(&hex_path),
    ]);
    assert!(output.status.success());
    let hex = fs::read_to_string(&hex_path).unwrap();
    assert_eq!(hex.lines().count(), 513);
    assert!(hex.starts_with(":1000000000000000"));
}

#[test]
fn encode_then_verify_and_view() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("small.bin");
    let hex_path = dir.path().join("small.hex");
    fs::write(&image_path, b"Hello, EPROM!!!!").unwrap();
    let output = romdump(&[
        "encode",
        path_str(&image_path),
        "--output",
        path_str(&hex_path),
        "--lf",
    ]);
    assert!(output.status.success());
    let hex = fs::read_to_string(&hex_path).unwrap();
    assert_eq!(hex.lines().count(), 513);
    assert!(!hex.contains('\r'));

    // The 16-byte image mirrors across the whole device, as does the
    // simulated chip reading it.
    let output = romdump(&[
        "verify",
        path_str(&hex_path),
        "--image",
        path_str(&image_path),
    ]);
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert_eq!(text, "all 8192 bytes match\n");

    let output = romdump(&["view", path_str(&hex_path)]);
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.starts_with("00000000: 48 65 6C 6C"));
    assert!(text.contains("|Hello, EPROM!!!!|"));
}

#[test]
fn verify_mismatch_fails() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("rom.bin");
    let hex_path = dir.path().join("expected.hex");
    fs::write(&image_path, vec![0x00u8; 0x2000]).unwrap();
    fs::write(&hex_path, ":0100200001DE\r\n:00000001FF\r\n").unwrap();
    let output = romdump(&[
        "verify",
        path_str(&hex_path),
        "--image",
        path_str(&image_path),
    ]);
    assert!(!output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.starts_with("8192 of 8192 bytes differ:"));
}

#[test]
fn encode_rejects_odd_sizes() {
    let dir = tempfile::tempdir().unwrap();
    let image_path = dir.path().join("odd.bin");
    fs::write(&image_path, vec![0u8; 0x300]).unwrap();
    let output = romdump(&["encode", path_str(&image_path)]);
    assert!(!output.status.success());
}

#[test]
fn print_config() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("romdump.toml");
    fs::write(&config_path, "[timing]\ndata_hold_us = 42\n").unwrap();
    let output = romdump(&["config", "--config", path_str(&config_path)]);
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("data_hold_us = 42"));
    assert!(text.contains("chip_enable = 63"));
}

//===========================================================================//
