use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar(cwd: &Path) -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_cyberschoold");
    let mut child = Command::new(exe)
        .current_dir(cwd)
        .env_remove("CYBERSCHOOL_WORKSPACE")
        .env_remove("CYBERSCHOOL_EXPORT_DIR")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn cyberschoold");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error")
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> String {
    assert_eq!(value.get("ok").and_then(|v| v.as_bool()), Some(false));
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string()
}

#[test]
fn export_writes_dated_file_and_import_restores_it() {
    let workspace = temp_dir("cyberschool-exchange");
    let out_dir = workspace.join("exports");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&workspace);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "auth.login",
        json!({ "login": "22", "password": "22" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let exported = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "exchange.export",
        json!({ "outDir": out_dir.to_string_lossy() }),
    );
    let file_name = exported["fileName"].as_str().expect("fileName").to_string();
    assert!(file_name.starts_with("cyberschool_data_"));
    assert!(file_name.ends_with(".json"));
    assert_eq!(file_name.len(), "cyberschool_data_2026-01-01.json".len());
    let path = PathBuf::from(exported["path"].as_str().expect("path"));
    assert_eq!(path, out_dir.join(&file_name));

    let on_disk: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).expect("read export")).expect("json");
    assert_eq!(on_disk["students"], exported["document"]["students"]);
    assert_eq!(on_disk["schedule"], exported["document"]["schedule"]);
    assert!(on_disk["exportDate"].as_str().is_some());

    let students_before = request_ok(&mut stdin, &mut reader, "4", "students.list", json!({}));
    let schedule_before = request_ok(&mut stdin, &mut reader, "5", "schedule.list", json!({}));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "students.delete",
        json!({ "id": 3 }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "schedule.delete",
        json!({ "id": 3 }),
    );

    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "exchange.import",
        json!({ "path": path.to_string_lossy() }),
    );
    assert_eq!(summary["studentsReplaced"], json!(true));
    assert_eq!(summary["scheduleReplaced"], json!(true));

    let students_after = request_ok(&mut stdin, &mut reader, "9", "students.list", json!({}));
    let schedule_after = request_ok(&mut stdin, &mut reader, "10", "schedule.list", json!({}));
    assert_eq!(students_after, students_before);
    assert_eq!(schedule_after, schedule_before);

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn partial_and_malformed_imports() {
    let workspace = temp_dir("cyberschool-exchange-partial");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&workspace);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "auth.login",
        json!({ "login": "22", "password": "22" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let students_before = request_ok(&mut stdin, &mut reader, "3", "students.list", json!({}));

    let doc = json!({
        "schedule": [
            { "id": 10, "day": "Суббота", "time": "?", "subject": "Сети", "teacher": "", "homework": "" }
        ]
    });
    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "exchange.import",
        json!({ "text": doc.to_string() }),
    );
    assert_eq!(summary["studentsReplaced"], json!(false));
    assert_eq!(summary["scheduleCount"], json!(1));
    let students_after = request_ok(&mut stdin, &mut reader, "5", "students.list", json!({}));
    assert_eq!(students_after, students_before);

    let schedule_before = request_ok(&mut stdin, &mut reader, "6", "schedule.list", json!({}));
    let bad = request(
        &mut stdin,
        &mut reader,
        "7",
        "exchange.import",
        json!({ "text": "this is { not json" }),
    );
    assert_eq!(error_code(&bad), "malformed_input");
    let schedule_after = request_ok(&mut stdin, &mut reader, "8", "schedule.list", json!({}));
    assert_eq!(schedule_after, schedule_before);
    let students_after = request_ok(&mut stdin, &mut reader, "9", "students.list", json!({}));
    assert_eq!(students_after, students_before);

    let missing = request(
        &mut stdin,
        &mut reader,
        "10",
        "exchange.import",
        json!({ "path": workspace.join("nope.json").to_string_lossy() }),
    );
    assert_eq!(error_code(&missing), "io_failed");

    let no_source = request(&mut stdin, &mut reader, "11", "exchange.import", json!({}));
    assert_eq!(error_code(&no_source), "bad_params");

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn loose_records_import_and_exhausted_ids_do_not_crash() {
    let workspace = temp_dir("cyberschool-exchange-loose");
    let (mut child, mut stdin, mut reader) = spawn_sidecar(&workspace);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "auth.login",
        json!({ "login": "22", "password": "22" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    for (i, text) in ["null", "7", "[]"].iter().enumerate() {
        let resp = request(
            &mut stdin,
            &mut reader,
            &format!("top-{i}"),
            "exchange.import",
            json!({ "text": text }),
        );
        assert_eq!(error_code(&resp), "malformed_input", "{text}");
    }

    let doc = json!({
        "students": [{
            "id": i64::MAX,
            "name": null,
            "group": "КБ-103",
            "subjects": [
                { "name": "Сети", "grade": 4.5 },
                { "name": "Криптография", "grade": null }
            ]
        }]
    });
    let summary = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "exchange.import",
        json!({ "text": doc.to_string() }),
    );
    assert_eq!(summary["studentCount"], json!(1));

    let list = request_ok(&mut stdin, &mut reader, "4", "students.list", json!({}));
    let student = &list["students"][0];
    assert_eq!(student["name"], json!(""));
    assert_eq!(student["subjects"][0]["grade"], json!(5));
    assert_eq!(student["subjects"][1]["grade"], json!(0));

    let exhausted = request(&mut stdin, &mut reader, "5", "students.beginNew", json!({}));
    assert_eq!(error_code(&exhausted), "ids_exhausted");

    let save = request(
        &mut stdin,
        &mut reader,
        "6",
        "students.save",
        json!({
            "student": { "id": 0, "name": "Big", "subjects": [{ "name": "x", "grade": i64::MAX }, { "name": "y", "grade": 1 }] },
            "isNew": true
        }),
    );
    assert_eq!(error_code(&save), "ids_exhausted");

    let health = request_ok(&mut stdin, &mut reader, "7", "health", json!({}));
    assert!(health.is_object());

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
