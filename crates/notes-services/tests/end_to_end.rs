use notes_core::ExportFormat;
use notes_services::{DirectoryExportSink, NoteBookBuilder};
use tempfile::tempdir;

#[test]
fn notes_lifecycle_survives_reopen() {
    let dir = tempdir().expect("tempdir");
    let db_path = dir.path().join("legendary-notes.db");

    let book = NoteBookBuilder::new(db_path.clone())
        .build()
        .expect("build note book");
    assert!(book.is_empty());

    let milk = book
        .add("Remember milk", "Errand")
        .expect("add milk")
        .expect("milk note");
    let report = book
        .add("Finish report", "")
        .expect("add report")
        .expect("report note");
    book.toggle_pin(report.id).expect("pin report");

    let view: Vec<_> = book.view("").into_iter().map(|note| note.id).collect();
    assert_eq!(view, vec![report.id, milk.id]);

    let errands: Vec<_> = book.view("errand").into_iter().map(|note| note.id).collect();
    assert_eq!(errands, vec![milk.id]);

    assert!(book.delete(milk.id).expect("delete milk"));
    drop(book);

    let reopened = NoteBookBuilder::new(db_path)
        .build()
        .expect("reopen note book");
    let notes = reopened.notes();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].id, report.id);
    assert!(notes[0].is_pinned);

    let sink = DirectoryExportSink::new(dir.path().join("exports"));
    let file = reopened
        .export(ExportFormat::Markdown, &sink)
        .expect("export markdown");
    assert_eq!(file.contents, "**Note**\n\nFinish report");
    assert!(sink.path_for(&file).exists());
}
