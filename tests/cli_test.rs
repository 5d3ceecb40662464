use rusqlite::Connection;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn create_source(path: &std::path::Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE users (_id INTEGER PRIMARY KEY, name TEXT);
         CREATE TABLE audit_log (_id INTEGER PRIMARY KEY, event TEXT);
         INSERT INTO users VALUES (1, 'Alice'), (2, 'Bob');
         INSERT INTO audit_log VALUES (1, 'login');",
    )
    .unwrap();
}

fn create_empty_target(path: &std::path::Path) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(
        "CREATE TABLE users (_id INTEGER PRIMARY KEY, name TEXT);
         CREATE TABLE audit_log (_id INTEGER PRIMARY KEY, event TEXT);",
    )
    .unwrap();
}

#[test]
fn test_export_and_import_commands() {
    let temp_dir = tempdir().unwrap();
    let source = temp_dir.path().join("source.db");
    let target = temp_dir.path().join("target.db");
    let xml_path = temp_dir.path().join("backup.xml");
    create_source(&source);
    create_empty_target(&target);

    let bin_path = env!("CARGO_BIN_EXE_sqlite-xml");

    let output = Command::new(bin_path)
        .arg("export")
        .arg("--db")
        .arg(&source)
        .arg("--output")
        .arg(&xml_path)
        .arg("--exclude-tables")
        .arg("audit_log")
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success(), "{:?}", output);

    let xml = fs::read_to_string(&xml_path).unwrap();
    assert!(xml.contains(r#"<table table_name="users">"#));
    assert!(!xml.contains("audit_log"));

    let output = Command::new(bin_path)
        .arg("import")
        .arg("--db")
        .arg(&target)
        .arg("--input")
        .arg(&xml_path)
        .arg("--strategy")
        .arg("replace-all")
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success(), "{:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2 inserted"));

    let conn = Connection::open(&target).unwrap();
    let names: Vec<String> = conn
        .prepare("SELECT name FROM users ORDER BY _id")
        .unwrap()
        .query_map([], |r| r.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(names, vec!["Alice", "Bob"]);
}

#[test]
fn test_export_to_stdout_with_config_file() {
    let temp_dir = tempdir().unwrap();
    let source = temp_dir.path().join("source.db");
    let config = temp_dir.path().join("sqlite-xml.toml");
    create_source(&source);
    fs::write(&config, "root_tag = \"backup\"\ntables = [\"audit_log\"]\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_sqlite-xml"))
        .arg("export")
        .arg("--db")
        .arg(&source)
        .arg("--config")
        .arg(&config)
        .arg("--compact")
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success(), "{:?}", output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(
        r#"<backup><table table_name="audit_log"><row _id="1" event="login"/></table></backup>"#
    ));
}

#[test]
fn test_atomic_import_rolls_back_on_error() {
    let temp_dir = tempdir().unwrap();
    let target = temp_dir.path().join("target.db");
    let xml_path = temp_dir.path().join("broken.xml");
    create_empty_target(&target);
    fs::write(
        &xml_path,
        r#"<database><table table_name="users"><row _id="1" name="Alice"/></table><table><row/></table></database>"#,
    )
    .unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_sqlite-xml"))
        .arg("import")
        .arg("--db")
        .arg(&target)
        .arg("--input")
        .arg(&xml_path)
        .arg("--atomic")
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("table_name not found in table element"));

    let conn = Connection::open(&target).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn test_tables_command_lists_row_counts() {
    let temp_dir = tempdir().unwrap();
    let source = temp_dir.path().join("source.db");
    create_source(&source);

    let output = Command::new(env!("CARGO_BIN_EXE_sqlite-xml"))
        .arg("tables")
        .arg("--db")
        .arg(&source)
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success(), "{:?}", output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout, "users\t2\naudit_log\t1\n");
}
