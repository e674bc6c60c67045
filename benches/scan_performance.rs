use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sitewatch::config::Config;
use sitewatch::deadline::Deadline;
use sitewatch::report::{self, Limits};
use sitewatch::scan;
use sitewatch::scan::files::capture_files;
use sitewatch::store::diff::{self, Content, ContentSource};
use sitewatch::db::Row;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Fixture generator for realistic site layouts
mod fixtures {
    use super::*;

    /// Create a document root with nested page directories
    pub fn create_site(base: &Path, depth: usize, files_per_dir: usize) -> std::io::Result<()> {
        create_tree_recursive(base, depth, files_per_dir)
    }

    fn create_tree_recursive(
        base: &Path,
        depth: usize,
        files_per_dir: usize,
    ) -> std::io::Result<()> {
        if depth == 0 {
            return Ok(());
        }

        fs::create_dir_all(base)?;

        for i in 0..files_per_dir {
            fs::write(
                base.join(format!("page-{i}.php")),
                format!("<?php echo 'page {i}'; ?>"),
            )?;
        }

        for i in 0..3 {
            let subdir = base.join(format!("dir-{i}"));
            create_tree_recursive(&subdir, depth - 1, files_per_dir)?;
        }

        Ok(())
    }

    /// Add excluded noise: a vendor tree and log files that must be skipped
    pub fn add_excluded_noise(base: &Path) -> std::io::Result<()> {
        let vendor = base.join("vendor").join("lib");
        fs::create_dir_all(&vendor)?;
        for i in 0..200 {
            fs::write(vendor.join(format!("dep-{i}.php")), vec![b'x'; 1024 * 10])?;
        }

        for i in 0..50 {
            fs::write(base.join(format!("access-{i}.log")), vec![b'l'; 1024 * 10])?;
        }

        Ok(())
    }

    /// Add a handful of large media files
    pub fn add_large_files(base: &Path) -> std::io::Result<()> {
        let uploads = base.join("uploads");
        fs::create_dir_all(&uploads)?;
        for i in 0..10 {
            fs::write(uploads.join(format!("image-{i}.png")), vec![0u8; 1024 * 512])?;
        }
        Ok(())
    }
}

/// Content source that never touches disk, so compare is measured alone
struct NoContent;

impl ContentSource for NoContent {
    fn file_content(&self, _path: &str) -> Content {
        Content::Unavailable
    }

    fn fetch_row(&self, _table: &str, _pk_column: &str, _pk_value: &str) -> sitewatch::Result<Option<Row>> {
        Ok(None)
    }
}

fn bench_config(root: &Path) -> Config {
    Config::for_root(root, root.join("state.json"))
}

/// Benchmark: Site tree hashing at increasing depth
fn bench_capture_files(c: &mut Criterion) {
    let mut group = c.benchmark_group("capture_files");

    for depth in [2, 3, 4] {
        group.bench_with_input(BenchmarkId::new("depth", depth), &depth, |b, &depth| {
            let temp_dir = TempDir::new().unwrap();
            fixtures::create_site(temp_dir.path(), depth, 10).unwrap();
            let config = bench_config(temp_dir.path());

            b.iter(|| {
                let result = capture_files(
                    black_box(&config.monitor_dir),
                    &config.excluded_dirs,
                    &config.excluded_extensions,
                    &Deadline::unbounded(),
                );
                black_box(result.unwrap());
            });
        });
    }

    group.finish();
}

/// Benchmark: Exclusion pruning (vendor and log noise should cost little)
fn bench_excluded_noise(c: &mut Criterion) {
    c.bench_function("capture_with_excluded_noise", |b| {
        let temp_dir = TempDir::new().unwrap();
        fixtures::create_site(temp_dir.path(), 2, 10).unwrap();
        fixtures::add_excluded_noise(temp_dir.path()).unwrap();
        let config = bench_config(temp_dir.path());

        b.iter(|| {
            let result = scan::capture(black_box(&config), None, &Deadline::unbounded());
            black_box(result.unwrap());
        });
    });
}

/// Benchmark: Streaming hash of large files
fn bench_large_files(c: &mut Criterion) {
    c.bench_function("capture_large_files", |b| {
        let temp_dir = TempDir::new().unwrap();
        fixtures::add_large_files(temp_dir.path()).unwrap();
        let config = bench_config(temp_dir.path());

        b.iter(|| {
            let result = scan::capture(black_box(&config), None, &Deadline::unbounded());
            black_box(result.unwrap());
        });
    });
}

/// Benchmark: Compare two captures where a third of the files drifted
fn bench_compare(c: &mut Criterion) {
    c.bench_function("compare_with_drift", |b| {
        let temp_dir = TempDir::new().unwrap();
        fixtures::create_site(temp_dir.path(), 4, 10).unwrap();
        let config = bench_config(temp_dir.path());
        let deadline = Deadline::unbounded();

        let (previous, _) = scan::capture(&config, None, &deadline).unwrap();
        let mut current = previous.clone();
        for (i, entry) in current.files.values_mut().enumerate() {
            if i % 3 == 0 {
                entry.content_hash = format!("changed-{i}");
            }
        }

        b.iter(|| {
            let changes = diff::compare(black_box(&previous), black_box(&current), &NoContent);
            black_box(changes.unwrap());
        });
    });
}

/// Benchmark: Report rendering for a large change set
fn bench_render_report(c: &mut Criterion) {
    c.bench_function("render_report", |b| {
        let temp_dir = TempDir::new().unwrap();
        fixtures::create_site(temp_dir.path(), 3, 10).unwrap();
        let config = bench_config(temp_dir.path());
        let deadline = Deadline::unbounded();

        let (current, _) = scan::capture(&config, None, &deadline).unwrap();
        let previous = sitewatch::snapshot::Snapshot::empty(current.timestamp - 3600);
        let changes = diff::compare(&previous, &current, &NoContent).unwrap();
        let limits = Limits::default();

        b.iter(|| {
            let body = report::render_report(
                black_box(&changes),
                previous.timestamp,
                current.timestamp,
                &limits,
            );
            black_box(body);
        });
    });
}

criterion_group!(
    benches,
    bench_capture_files,
    bench_excluded_noise,
    bench_large_files,
    bench_compare,
    bench_render_report,
);

criterion_main!(benches);
