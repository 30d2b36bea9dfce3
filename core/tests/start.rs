use std::{io::Write, path::PathBuf};

use docloader::{
    start_loader, ConnectionSettings, InputError, InputSource, LoadFromInputError, LoadOutcome,
    StartDetails,
};
use tempfile::NamedTempFile;

fn dry_run(input: InputSource) -> StartDetails {
    StartDetails {
        input,
        table: "documents".to_string(),
        connection: ConnectionSettings::default(),
        dry_run: true,
    }
}

fn file_with(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[tokio::test]
async fn dry_run_loads_file_into_memory() {
    let file = file_with(r#"[{"name": "Jane", "account": 1}, {"branch": "Pune"}]"#);

    let outcome = start_loader(dry_run(InputSource::File(file.path().to_path_buf())))
        .await
        .unwrap();

    let LoadOutcome::Loaded { summary, table } = outcome else {
        panic!("expected a loaded batch");
    };
    assert_eq!(summary.table, "documents");
    assert_eq!(summary.rows_inserted, 2);
    assert!(summary.table_dropped);

    let table = table.expect("dry run returns the table");
    assert_eq!(table.columns(), ["account", "name", "branch"]);
    assert_eq!(table.rows().len(), 2);
    assert_eq!(table.value(0, "name"), Some("Jane"));
    assert_eq!(table.value(0, "account"), Some("1"));
    assert_eq!(table.value(0, "branch"), None);
    assert_eq!(table.value(1, "branch"), Some("Pune"));
    assert_eq!(table.value(1, "name"), None);
}

#[tokio::test]
async fn dry_run_uses_the_requested_table() {
    let file = file_with(r#"[{"a": "1"}]"#);
    let mut details = dry_run(InputSource::File(file.path().to_path_buf()));
    details.table = "forms".to_string();

    let outcome = start_loader(details).await.unwrap();

    assert!(matches!(
        outcome,
        LoadOutcome::Loaded { ref summary, table: Some(ref table) }
            if summary.table == "forms" && table.value(0, "a") == Some("1")
    ));
}

#[tokio::test]
async fn empty_file_loads_nothing() {
    let file = file_with(" \n\t");

    let outcome = start_loader(dry_run(InputSource::File(file.path().to_path_buf())))
        .await
        .unwrap();

    assert!(matches!(outcome, LoadOutcome::NothingToLoad));
}

#[tokio::test]
async fn malformed_file_is_a_failed_outcome() {
    let file = file_with(r#"[{"a": "1"},"#);

    let outcome = start_loader(dry_run(InputSource::File(file.path().to_path_buf())))
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        LoadOutcome::Failed(LoadFromInputError::Input(InputError::Malformed(_)))
    ));
}

#[tokio::test]
async fn missing_file_is_a_failed_outcome() {
    let missing = PathBuf::from("/definitely/not/here/batch.json");

    let outcome = start_loader(dry_run(InputSource::File(missing))).await.unwrap();

    assert!(matches!(outcome, LoadOutcome::Failed(LoadFromInputError::Input(InputError::Io(_)))));
}

#[tokio::test]
async fn dry_run_ignores_connection_settings() {
    let file = file_with(r#"[{"a": "1"}]"#);
    let mut details = dry_run(InputSource::File(file.path().to_path_buf()));
    details.connection = ConnectionSettings::Url("not a connection string".to_string());

    let outcome = start_loader(details).await.unwrap();

    assert!(matches!(outcome, LoadOutcome::Loaded { .. }));
}
