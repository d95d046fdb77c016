mod test_support;

use std::process::Stdio;
use test_support::{sidecar_command, temp_dir};

#[test]
fn missing_store_settings_stop_startup() {
    let workspace = temp_dir("clientpay-noconfig");
    let output = sidecar_command(&workspace)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("run clientpayd");

    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("CLIENTPAY_STORE_URL"), "stderr: {}", stderr);
    assert!(stderr.contains("CLIENTPAY_STORE_KEY"), "stderr: {}", stderr);
}

#[test]
fn config_file_in_working_directory_is_honored() {
    let workspace = temp_dir("clientpay-filecfg");
    let db = workspace.join("from-file.sqlite3");
    std::fs::write(
        workspace.join("clientpay.toml"),
        format!(
            "store_url = \"sqlite:{}\"\nstore_key = \"file-key\"\n",
            db.to_string_lossy().replace('\\', "/")
        ),
    )
    .expect("write config");

    let output = sidecar_command(&workspace)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .expect("run clientpayd");

    // Empty stdin: clean shutdown after opening the store.
    assert_eq!(output.status.code(), Some(0));
    assert!(db.exists());
}

#[test]
fn unsupported_store_url_is_fatal() {
    let workspace = temp_dir("clientpay-badurl");
    let output = sidecar_command(&workspace)
        .env("CLIENTPAY_STORE_URL", "ftp://example.test")
        .env("CLIENTPAY_STORE_KEY", "k")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .expect("run clientpayd");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("opening record store"), "stderr: {}", stderr);
}
