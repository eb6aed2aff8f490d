use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use gomon::deps::{DependencyGraph, GoModule};
use gomon::errors::GomonError;
use gomon::fs::RealFileSystem;
use gomon_test_utils::GoProject;

fn graph(project: &GoProject) -> DependencyGraph {
    let module = GoModule::discover(&RealFileSystem, project.root()).unwrap();
    DependencyGraph::new(module, Arc::new(RealFileSystem))
}

fn paths(project: &GoProject, rels: &[&str]) -> HashSet<PathBuf> {
    rels.iter().map(|r| project.path(r)).collect()
}

#[test]
fn resolves_module_internal_imports_only() {
    let project = GoProject::new("github.com/acme/shop")
        .with_file(
            "cmd/api/main.go",
            r#"package main

import (
    "fmt"
    "net/http"

    "github.com/acme/shop/pkg/shared"
    orders "github.com/acme/shop/internal/orders"
    "github.com/acme/shopfront/ui"
    "github.com/lib/pq"
)

func main() { fmt.Println(shared.Name, orders.X, http.MethodGet) }
"#,
        )
        .with_file("cmd/api/routes.go", "package main\n")
        .with_file("pkg/shared/shared.go", "package shared\n\nconst Name = \"x\"\n")
        .with_file("pkg/shared/shared_test.go", "package shared\n")
        .with_file("pkg/shared/nested/deeper.go", "package nested\n")
        .with_file(
            "internal/orders/orders.go",
            "package orders\n\nimport _ \"github.com/acme/shop/internal/db\"\n\nvar X = 1\n",
        )
        .with_file("internal/db/db.go", "package db\n")
        .with_file("internal/unused/unused.go", "package unused\n");

    let files = graph(&project).resolve(&project.path("cmd/api"));
    assert_eq!(
        files,
        paths(
            &project,
            &[
                "cmd/api/main.go",
                "cmd/api/routes.go",
                "pkg/shared/shared.go",
                "pkg/shared/shared_test.go",
                "internal/orders/orders.go",
                "internal/db/db.go",
            ]
        )
    );
}

#[test]
fn import_cycles_terminate() {
    let project = GoProject::new("example.com/cyc")
        .with_file("cmd/app/main.go", "package main\nimport \"example.com/cyc/pkg/a\"\n")
        .with_file("pkg/a/a.go", "package a\nimport \"example.com/cyc/pkg/b\"\n")
        .with_file("pkg/b/b.go", "package b\nimport \"example.com/cyc/pkg/c\"\n")
        .with_file("pkg/c/c.go", "package c\nimport \"example.com/cyc/pkg/a\"\n");

    let files = graph(&project).resolve(&project.path("cmd/app"));
    assert_eq!(
        files,
        paths(&project, &["cmd/app/main.go", "pkg/a/a.go", "pkg/b/b.go", "pkg/c/c.go"])
    );
}

#[test]
fn file_entry_seeds_only_itself() {
    let project = GoProject::new("example.com/m")
        .with_file("cmd/tool/main.go", "package main\nimport \"example.com/m/pkg/util\"\n")
        .with_file("cmd/tool/other.go", "package main\n")
        .with_file("pkg/util/util.go", "package util\n");

    let files = graph(&project).resolve(&project.path("cmd/tool/main.go"));
    assert_eq!(files, paths(&project, &["cmd/tool/main.go", "pkg/util/util.go"]));
}

#[test]
fn broken_sources_contribute_nothing() {
    let project = GoProject::new("example.com/m")
        .with_file("cmd/app/main.go", "package main\nimport \"example.com/m/pkg/broken\"\n")
        .with_file(
            "pkg/broken/broken.go",
            "package broken\nimport \"example.com/m/pkg/never\n",
        )
        .with_file("pkg/never/never.go", "package never\n");

    let files = graph(&project).resolve(&project.path("cmd/app"));
    assert_eq!(files, paths(&project, &["cmd/app/main.go", "pkg/broken/broken.go"]));
}

#[test]
fn missing_entry_resolves_to_itself() {
    let project = GoProject::new("example.com/m");
    let files = graph(&project).resolve(&project.path("cmd/ghost/main.go"));
    assert_eq!(files, paths(&project, &["cmd/ghost/main.go"]));
}

#[test]
fn discover_reads_quoted_module_directive() {
    let project = GoProject::new("placeholder");
    project.file("go.mod", "// comment\nmodule \"example.com/quoted\" // trailing\n\ngo 1.22\n");
    let module = GoModule::discover(&RealFileSystem, project.root()).unwrap();
    assert_eq!(module.path(), "example.com/quoted");
    assert_eq!(module.root(), project.root());
}

#[test]
fn discover_fails_without_go_mod() {
    let dir = tempfile::tempdir().unwrap();
    let err = GoModule::discover(&RealFileSystem, dir.path()).unwrap_err();
    assert!(matches!(err, GomonError::GoModule { .. }));
}
