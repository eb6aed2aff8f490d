use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use gomon::deps::{DependencyGraph, GoModule};
use gomon::fs::RealFileSystem;
use gomon::watch::{spawn_watcher, AppWatchHandle, RestartSignal, TrackedFiles, WatcherSettings};
use gomon_test_utils::{eventually, init_tracing, with_timeout, GoProject};
use tokio_util::sync::CancellationToken;

const WINDOW: Duration = Duration::from_millis(300);

fn shop() -> GoProject {
    GoProject::new("example.com/shop")
        .with_file(
            "cmd/api/main.go",
            "package main\n\nimport \"example.com/shop/pkg/shared\"\n\nfunc main() { shared.Hello() }\n",
        )
        .with_file("cmd/worker/main.go", "package main\n\nfunc main() {}\n")
        .with_file("pkg/shared/shared.go", "package shared\n\nfunc Hello() {}\n")
}

struct App {
    handle: AppWatchHandle,
    restarts: Arc<AtomicUsize>,
}

impl App {
    fn new(project: &GoProject, name: &str, entry: &str) -> Self {
        let module = GoModule::discover(&RealFileSystem, project.root()).unwrap();
        let graph = Arc::new(DependencyGraph::new(module, Arc::new(RealFileSystem)));
        let handle = AppWatchHandle {
            name: name.to_string(),
            files: TrackedFiles::resolve(graph, &project.path(entry)),
            restart: RestartSignal::new(),
        };

        let restarts = Arc::new(AtomicUsize::new(0));
        let signal = handle.restart.clone();
        let counter = Arc::clone(&restarts);
        tokio::spawn(async move {
            loop {
                signal.notified().await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        Self { handle, restarts }
    }

    fn restarts(&self) -> usize {
        self.restarts.load(Ordering::SeqCst)
    }
}

fn settings(project: &GoProject) -> WatcherSettings {
    WatcherSettings {
        root: project.root().to_path_buf(),
        directories: vec![PathBuf::from("cmd"), PathBuf::from("pkg")],
        debounce: WINDOW,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn shared_package_change_restarts_only_its_dependents() {
    init_tracing();
    let project = shop();
    let api = App::new(&project, "api", "cmd/api");
    let worker = App::new(&project, "worker", "cmd/worker");
    let cancel = CancellationToken::new();
    let watcher = spawn_watcher(
        settings(&project),
        vec![api.handle.clone(), worker.handle.clone()],
        cancel.clone(),
    )
    .unwrap();

    project.append("pkg/shared/shared.go", "\n// touched\n");

    with_timeout(eventually(|| api.restarts() == 1)).await;
    tokio::time::sleep(WINDOW * 3).await;
    assert_eq!(api.restarts(), 1);
    assert_eq!(worker.restarts(), 0);

    cancel.cancel();
    watcher.join().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn burst_of_writes_restarts_once() {
    init_tracing();
    let project = shop();
    let api = App::new(&project, "api", "cmd/api");
    let cancel = CancellationToken::new();
    let watcher = spawn_watcher(settings(&project), vec![api.handle.clone()], cancel.clone()).unwrap();

    for i in 0..6 {
        project.append("cmd/api/main.go", &format!("// edit {i}\n"));
        tokio::time::sleep(WINDOW / 6).await;
    }

    with_timeout(eventually(|| api.restarts() >= 1)).await;
    tokio::time::sleep(WINDOW * 3).await;
    assert_eq!(api.restarts(), 1);

    cancel.cancel();
    watcher.join().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn spaced_writes_restart_each_time() {
    init_tracing();
    let project = shop();
    let api = App::new(&project, "api", "cmd/api");
    let cancel = CancellationToken::new();
    let watcher = spawn_watcher(settings(&project), vec![api.handle.clone()], cancel.clone()).unwrap();

    for expected in 1..=3 {
        project.append("pkg/shared/shared.go", "// edit\n");
        with_timeout(eventually(|| api.restarts() == expected)).await;
        tokio::time::sleep(WINDOW * 2).await;
    }
    assert_eq!(api.restarts(), 3);

    cancel.cancel();
    watcher.join().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn removed_file_stops_being_tracked() {
    init_tracing();
    let project = shop();
    let api = App::new(&project, "api", "cmd/api");
    let shared = project.path("pkg/shared/shared.go");
    assert!(api.handle.files.contains(&shared));

    let cancel = CancellationToken::new();
    let watcher = spawn_watcher(settings(&project), vec![api.handle.clone()], cancel.clone()).unwrap();

    fs::remove_file(&shared).unwrap();
    let files = api.handle.files.clone();
    with_timeout(eventually(|| !files.contains(&shared))).await;

    tokio::time::sleep(WINDOW * 3).await;
    assert_eq!(api.restarts(), 0);

    cancel.cancel();
    watcher.join().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn new_import_is_followed_after_a_write() {
    init_tracing();
    let project = shop().with_file("pkg/extra/extra.go", "package extra\n");
    let worker = App::new(&project, "worker", "cmd/worker");
    let extra = project.path("pkg/extra/extra.go");
    assert!(!worker.handle.files.contains(&extra));

    let cancel = CancellationToken::new();
    let watcher = spawn_watcher(settings(&project), vec![worker.handle.clone()], cancel.clone()).unwrap();

    project.file(
        "cmd/worker/main.go",
        "package main\n\nimport _ \"example.com/shop/pkg/extra\"\n\nfunc main() {}\n",
    );
    with_timeout(eventually(|| worker.restarts() == 1)).await;
    assert!(worker.handle.files.contains(&extra));

    // The newly tracked package now triggers restarts too.
    project.append("pkg/extra/extra.go", "// edit\n");
    with_timeout(eventually(|| worker.restarts() == 2)).await;

    cancel.cancel();
    watcher.join().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn directories_created_later_are_watched() {
    init_tracing();
    let project = shop();
    let worker = App::new(&project, "worker", "cmd/worker");
    let cancel = CancellationToken::new();
    let watcher = spawn_watcher(settings(&project), vec![worker.handle.clone()], cancel.clone()).unwrap();

    // Nested package that did not exist when the watcher started.
    let deep = project.file("pkg/fresh/deep/deep.go", "package deep\n");
    tokio::time::sleep(WINDOW).await;
    assert_eq!(worker.restarts(), 0);

    project.file(
        "cmd/worker/main.go",
        "package main\n\nimport _ \"example.com/shop/pkg/fresh/deep\"\n\nfunc main() {}\n",
    );
    with_timeout(eventually(|| worker.restarts() == 1)).await;
    assert!(worker.handle.files.contains(&deep));

    project.append("pkg/fresh/deep/deep.go", "// edit\n");
    with_timeout(eventually(|| worker.restarts() == 2)).await;
    tokio::time::sleep(WINDOW * 2).await;
    assert_eq!(worker.restarts(), 2);

    cancel.cancel();
    watcher.join().await;
}
