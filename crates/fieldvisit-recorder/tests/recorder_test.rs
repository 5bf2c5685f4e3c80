use std::path::Path;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use fieldvisit_core::{
    AppError, Attachment, AttachmentSet, Category, CollisionPolicy, Config, Roster, VisitDraft,
    VisitRecord,
};
use fieldvisit_recorder::{Ledger, LedgerRow, SubmissionRecorder};
use tempfile::{tempdir, TempDir};

fn visit_at(date: (i32, u32, u32), time: (u32, u32)) -> VisitRecord {
    VisitDraft {
        visit_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2),
        visit_time: NaiveTime::from_hms_opt(time.0, time.1, 0),
        latitude: "-23.550520".to_string(),
        longitude: "-46.633308".to_string(),
        preservation: "Local preservado".to_string(),
        vehicle: "VTR 1234".to_string(),
        companion: "Sd. Silva".to_string(),
        materials: "Swab\nFita".to_string(),
        notes: "Arrombamento na porta dos fundos".to_string(),
        ..VisitDraft::default()
    }
    .finalize(&Roster::default())
    .unwrap()
}

fn visit() -> VisitRecord {
    visit_at((2024, 3, 5), (14, 7))
}

fn photos(prefix: &str, n: usize) -> Vec<Attachment> {
    (1..=n)
        .map(|i| Attachment::new(format!("{prefix}{i}.png"), format!("{prefix}-{i}").into_bytes()))
        .collect()
}

async fn recorder(dir: &TempDir, policy: CollisionPolicy) -> SubmissionRecorder {
    let config = Config::for_base_dir(dir.path()).with_collision_policy(policy);
    SubmissionRecorder::from_config(&config).await.unwrap()
}

fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter(|e| e.as_ref().unwrap().file_type().unwrap().is_file())
        .count()
}

#[tokio::test]
async fn writes_one_file_per_retained_attachment() {
    let dir = tempdir().unwrap();
    let recorder = recorder(&dir, CollisionPolicy::Merge).await;

    let attachments = AttachmentSet::new()
        .with(Category::Facade, photos("f", 1))
        .with(Category::Access, photos("a", 2))
        .with(Category::Traces, photos("t", 10))
        .with(Category::PrintsDna, photos("p", 4));

    let receipt = recorder.record(visit(), attachments).await.unwrap();

    assert_eq!(receipt.written.len(), 1 + 2 + 10 + 4);
    assert_eq!(receipt.dropped_total(), 0);

    let visit_dir = dir.path().join("fotos").join("2024-03-05_14-07");
    assert_eq!(count_files(&visit_dir.join("facade")), 1);
    assert_eq!(count_files(&visit_dir.join("access")), 2);
    assert_eq!(count_files(&visit_dir.join("traces")), 10);
    assert_eq!(count_files(&visit_dir.join("prints_dna")), 4);

    for i in 1..=10 {
        assert!(visit_dir.join("traces").join(format!("traces_{i}.jpg")).is_file());
    }
    assert_eq!(
        std::fs::read(visit_dir.join("prints_dna/prints_dna_3.jpg")).unwrap(),
        b"p-3"
    );
}

#[tokio::test]
async fn extra_access_photos_are_dropped() {
    let dir = tempdir().unwrap();
    let recorder = recorder(&dir, CollisionPolicy::Merge).await;

    let attachments = AttachmentSet::new().with(Category::Access, photos("a", 5));
    let receipt = recorder.record(visit(), attachments).await.unwrap();

    let access = dir.path().join("fotos/2024-03-05_14-07/access");
    assert_eq!(count_files(&access), 3);
    assert!(!access.join("access_4.jpg").exists());
    assert_eq!(std::fs::read(access.join("access_3.jpg")).unwrap(), b"a-3");
    assert_eq!(receipt.dropped.get(&Category::Access), Some(&2));
    assert_eq!(receipt.written.len(), 3);
}

#[tokio::test]
async fn empty_category_still_gets_a_directory() {
    let dir = tempdir().unwrap();
    let recorder = recorder(&dir, CollisionPolicy::Merge).await;

    let receipt = recorder.record(visit(), AttachmentSet::new()).await.unwrap();

    assert!(receipt.written.is_empty());
    let visit_dir = dir.path().join("fotos/2024-03-05_14-07");
    for category in Category::ALL {
        let sub = visit_dir.join(category.slug());
        assert!(sub.is_dir(), "{} should exist", sub.display());
        assert_eq!(count_files(&sub), 0);
    }
}

#[tokio::test]
async fn ledger_grows_by_one_row_per_submission() {
    let dir = tempdir().unwrap();
    let recorder = recorder(&dir, CollisionPolicy::Merge).await;

    let first = recorder
        .record(visit_at((2024, 1, 1), (8, 0)), AttachmentSet::new())
        .await
        .unwrap();
    assert_eq!(first.ledger_rows, 1);

    for minute in 1..=4 {
        recorder
            .record(visit_at((2024, 1, 1), (8, minute)), AttachmentSet::new())
            .await
            .unwrap();
    }

    // same visit submitted twice still produces two rows
    recorder
        .record(visit_at((2024, 1, 1), (8, 4)), AttachmentSet::new())
        .await
        .unwrap();

    let rows = recorder.ledger().load().await.unwrap();
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[4], rows[5]);
}

#[tokio::test]
async fn storage_path_round_trips_through_ledger() {
    let dir = tempdir().unwrap();
    let recorder = recorder(&dir, CollisionPolicy::Merge).await;

    let receipt = recorder
        .record(visit(), AttachmentSet::new().with(Category::Facade, photos("f", 1)))
        .await
        .unwrap();

    assert!(receipt.storage_path.ends_with("2024-03-05_14-07"));
    assert_eq!(receipt.visit_dir_name, "2024-03-05_14-07");
    assert_eq!(
        receipt.visit.storage_path.as_deref(),
        Some(receipt.storage_path.as_str())
    );
    assert!(Path::new(&receipt.storage_path).join("facade/facade_1.jpg").is_file());

    let reloaded = Ledger::new(dir.path().join("dados_campo.xlsx"))
        .load()
        .await
        .unwrap();
    assert_eq!(reloaded.len(), 1);
    let row = &reloaded[0];
    assert_eq!(row.storage_path, receipt.storage_path);
    assert_eq!(row.visit_date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    assert_eq!(row.visit_time, NaiveTime::from_hms_opt(14, 7, 0).unwrap());
    assert_eq!(row.photographer, Roster::default().default_name());
    assert_eq!(row.materials, "Swab\nFita");
    assert_eq!(row.latitude, "-23.550520");
}

#[tokio::test]
async fn same_minute_submissions_merge_and_overwrite() {
    let dir = tempdir().unwrap();
    let recorder = recorder(&dir, CollisionPolicy::Merge).await;

    let first = recorder
        .record(visit(), AttachmentSet::new().with(Category::Access, photos("first", 3)))
        .await
        .unwrap();
    let second = recorder
        .record(visit(), AttachmentSet::new().with(Category::Access, photos("second", 1)))
        .await
        .unwrap();

    assert_eq!(first.storage_path, second.storage_path);

    let access = dir.path().join("fotos/2024-03-05_14-07/access");
    assert_eq!(std::fs::read(access.join("access_1.jpg")).unwrap(), b"second-1");
    // indexes the second submission did not reach keep the first submission's photos
    assert_eq!(std::fs::read(access.join("access_2.jpg")).unwrap(), b"first-2");
    assert_eq!(count_files(&access), 3);

    let rows = recorder.ledger().load().await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].storage_path, rows[1].storage_path);
}

#[tokio::test]
async fn same_minute_submissions_get_suffixed_directories() {
    let dir = tempdir().unwrap();
    let recorder = recorder(&dir, CollisionPolicy::Suffix).await;

    let first = recorder
        .record(visit(), AttachmentSet::new().with(Category::Access, photos("first", 1)))
        .await
        .unwrap();
    let second = recorder
        .record(visit(), AttachmentSet::new().with(Category::Access, photos("second", 1)))
        .await
        .unwrap();
    let third = recorder.record(visit(), AttachmentSet::new()).await.unwrap();

    assert_eq!(first.visit_dir_name, "2024-03-05_14-07");
    assert_eq!(second.visit_dir_name, "2024-03-05_14-07_2");
    assert_eq!(third.visit_dir_name, "2024-03-05_14-07_3");

    let fotos = dir.path().join("fotos");
    assert_eq!(
        std::fs::read(fotos.join("2024-03-05_14-07/access/access_1.jpg")).unwrap(),
        b"first-1"
    );
    assert_eq!(
        std::fs::read(fotos.join("2024-03-05_14-07_2/access/access_1.jpg")).unwrap(),
        b"second-1"
    );

    let rows = recorder.ledger().load().await.unwrap();
    assert!(rows[1].storage_path.ends_with("2024-03-05_14-07_2"));
}

#[tokio::test]
async fn concurrent_submissions_do_not_lose_rows() {
    let dir = tempdir().unwrap();
    let recorder = Arc::new(recorder(&dir, CollisionPolicy::Merge).await);

    let mut tasks = tokio::task::JoinSet::new();
    for minute in 0..10 {
        let recorder = Arc::clone(&recorder);
        tasks.spawn(async move {
            recorder
                .record(
                    visit_at((2024, 6, 1), (9, minute)),
                    AttachmentSet::new().with(Category::Traces, photos("t", 2)),
                )
                .await
        });
    }
    while let Some(result) = tasks.join_next().await {
        result.unwrap().unwrap();
    }

    assert_eq!(recorder.ledger().load().await.unwrap().len(), 10);
}

#[tokio::test]
async fn malformed_ledger_fails_after_photos_are_written() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("dados_campo.xlsx"), "Data;Hora\n05/03/2024;14:07\n").unwrap();
    let recorder = recorder(&dir, CollisionPolicy::Merge).await;

    let err = recorder
        .record(visit(), AttachmentSet::new().with(Category::Facade, photos("f", 1)))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Ledger(_)));
    // no rollback: the photo stays on disk without a ledger row
    assert!(dir
        .path()
        .join("fotos/2024-03-05_14-07/facade/facade_1.jpg")
        .is_file());
}

#[tokio::test]
async fn photo_write_failure_aborts_before_the_ledger() {
    let dir = tempdir().unwrap();
    let visit_dir = dir.path().join("fotos/2024-03-05_14-07");
    std::fs::create_dir_all(&visit_dir).unwrap();
    // a regular file where the category directory should go
    std::fs::write(visit_dir.join("facade"), b"").unwrap();
    let recorder = recorder(&dir, CollisionPolicy::Merge).await;

    let err = recorder
        .record(visit(), AttachmentSet::new().with(Category::Facade, photos("f", 1)))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Storage(_)));
    assert!(!dir.path().join("dados_campo.xlsx").exists());
}

#[tokio::test]
async fn appends_to_a_ledger_kept_by_hand() {
    let dir = tempdir().unwrap();
    let ledger_path = dir.path().join("dados_campo.xlsx");

    let mut workbook = rust_xlsxwriter::Workbook::new();
    let sheet = workbook.add_worksheet();
    let previous = [
        "01/02/2024", "10:15", "", "", "Local violado", "VTR 77", "", "Ana", "", "",
        "formulario_campo/fotos/2024-02-01_10-15",
    ];
    for (col, name) in LedgerRow::COLUMNS.iter().enumerate() {
        sheet.write_string(0, col as u16, *name).unwrap();
    }
    for (col, value) in previous.iter().enumerate() {
        sheet.write_string(1, col as u16, *value).unwrap();
    }
    workbook.save(&ledger_path).unwrap();

    let recorder = recorder(&dir, CollisionPolicy::Merge).await;
    let receipt = recorder.record(visit(), AttachmentSet::new()).await.unwrap();
    assert_eq!(receipt.ledger_rows, 2);

    let rows = recorder.ledger().load().await.unwrap();
    assert_eq!(rows[0].vehicle, "VTR 77");
    assert_eq!(rows[0].storage_path, "formulario_campo/fotos/2024-02-01_10-15");
    assert_eq!(rows[1].storage_path, receipt.storage_path);
}

#[tokio::test]
async fn preexisting_rows_are_preserved() {
    let dir = tempdir().unwrap();
    let config = Config::for_base_dir(dir.path());
    {
        let recorder = SubmissionRecorder::from_config(&config).await.unwrap();
        recorder
            .record(visit_at((2023, 12, 31), (23, 59)), AttachmentSet::new())
            .await
            .unwrap();
    }

    // a fresh recorder reloads the ledger from disk
    let recorder = SubmissionRecorder::from_config(&config).await.unwrap();
    let receipt = recorder.record(visit(), AttachmentSet::new()).await.unwrap();
    assert_eq!(receipt.ledger_rows, 2);

    let rows = recorder.ledger().load().await.unwrap();
    assert!(rows[0].storage_path.ends_with("2023-12-31_23-59"));
    assert!(rows[1].storage_path.ends_with("2024-03-05_14-07"));
}
