use std::fs;
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use tempfile::TempDir;
use tplview::watcher::{plan_watches, DirectoryWatch, FileEventKind, WatchHandle, WatchScope};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[test]
fn test_poll_reports_created_changed_deleted() {
    let ws = TempDir::new().unwrap();
    let root = ws.path().join("templates");
    write(ws.path(), "templates/a.j2", "a");
    let mut watch = DirectoryWatch::new(&root, WatchScope::Template, "j2");

    assert!(watch.poll().is_empty());

    write(ws.path(), "templates/sub/b.j2", "b");
    let events = watch.poll();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, FileEventKind::Created);
    assert_eq!(events[0].scope, WatchScope::Template);
    assert_eq!(events[0].path, root.join("sub/b.j2"));

    write(ws.path(), "templates/a.j2", "a, but longer");
    let events = watch.poll();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, FileEventKind::Changed);

    fs::remove_file(root.join("a.j2")).unwrap();
    let events = watch.poll();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, FileEventKind::Deleted);
    assert_eq!(events[0].path, root.join("a.j2"));
}

#[test]
fn test_other_extensions_are_ignored() {
    let ws = TempDir::new().unwrap();
    let root = ws.path().join("templates");
    fs::create_dir_all(&root).unwrap();
    let mut watch = DirectoryWatch::new(&root, WatchScope::Partial, "j2");

    write(ws.path(), "templates/notes.txt", "x");
    assert!(watch.poll().is_empty());
}

#[test]
fn test_root_created_later() {
    let ws = TempDir::new().unwrap();
    let mut watch = DirectoryWatch::new(ws.path().join("views"), WatchScope::Template, "j2");

    write(ws.path(), "views/new.j2", "new");
    let events = watch.poll();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, FileEventKind::Created);
}

#[test]
fn test_plan_skips_covered_partial_roots() {
    let ws = TempDir::new().unwrap();
    let templates = vec![ws.path().join("templates")];
    let partials = vec![ws.path().join("templates/partials"), ws.path().join("shared")];

    let watches = plan_watches(&templates, &partials, "j2");

    assert_eq!(watches.len(), 2);
    assert_eq!(watches[0].root(), ws.path().join("templates"));
    assert_eq!(watches[0].scope(), WatchScope::Template);
    assert_eq!(watches[1].root(), ws.path().join("shared"));
    assert_eq!(watches[1].scope(), WatchScope::Partial);
}

#[test]
fn test_plan_excludes_template_roots_under_a_partial_root() {
    let ws = TempDir::new().unwrap();
    write(ws.path(), "templates/a.j2", "a");
    write(ws.path(), "shared/b.j2", "b");
    let templates = vec![ws.path().join("templates")];
    let partials = vec![ws.path().join(".")];

    let mut watches = plan_watches(&templates, &partials, "j2");
    assert_eq!(watches.len(), 2);

    write(ws.path(), "templates/a.j2", "a, edited");
    let events: Vec<_> = watches.iter_mut().flat_map(|w| w.poll()).collect();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].scope, WatchScope::Template);
    assert_eq!(events[0].kind, FileEventKind::Changed);

    write(ws.path(), "shared/b.j2", "b, edited");
    let events: Vec<_> = watches.iter_mut().flat_map(|w| w.poll()).collect();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].scope, WatchScope::Partial);
}

#[test]
fn test_excluded_directory_is_not_reported() {
    let ws = TempDir::new().unwrap();
    let mut watch = DirectoryWatch::excluding(
        ws.path(),
        WatchScope::Partial,
        "j2",
        vec![ws.path().join("templates")],
    );

    write(ws.path(), "templates/deep/x.j2", "x");
    assert!(watch.poll().is_empty());

    write(ws.path(), "other/y.j2", "y");
    assert_eq!(watch.poll().len(), 1);
}

#[test]
fn test_plan_with_fallback_partials() {
    let ws = TempDir::new().unwrap();
    let templates = vec![ws.path().join("templates"), ws.path().join("views")];

    let watches = plan_watches(&templates, &templates, "j2");

    assert_eq!(watches.len(), 2);
    assert!(watches.iter().all(|w| w.scope() == WatchScope::Template));
}

#[test]
fn test_spawned_watch_delivers_events() {
    let ws = TempDir::new().unwrap();
    let root = ws.path().join("templates");
    fs::create_dir_all(&root).unwrap();
    let watch = DirectoryWatch::new(&root, WatchScope::Template, "j2");
    let (tx, rx) = mpsc::channel();

    let handle = WatchHandle::spawn(vec![watch], Duration::from_millis(10), move |event| {
        tx.send(event).is_ok()
    });
    write(ws.path(), "templates/fresh.j2", "fresh");

    let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(event.kind, FileEventKind::Created);
    assert_eq!(event.path, root.join("fresh.j2"));

    handle.release();
}

#[test]
fn test_release_stops_polling() {
    let ws = TempDir::new().unwrap();
    let root = ws.path().join("templates");
    fs::create_dir_all(&root).unwrap();
    let (tx, rx) = mpsc::channel();

    let handle = WatchHandle::spawn(
        vec![DirectoryWatch::new(&root, WatchScope::Template, "j2")],
        Duration::from_millis(10),
        move |event| tx.send(event).is_ok(),
    );
    handle.release();

    write(ws.path(), "templates/late.j2", "late");
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
}
