//! Benchmarks for dotmill
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::path::{Path, PathBuf};

fn benchmark_dest_path_mapping(c: &mut Criterion) {
    use dotmill::job::RenderJob;

    c.bench_function("dest_path_mapping", |b| {
        let job = RenderJob::new(
            PathBuf::from("intro/sub/deeper"),
            "state-machine.dot".into(),
            4096,
        );
        let mirror_root = Path::new("bin/intro");

        b.iter(|| {
            let dest = job.dest_path(mirror_root, "svg");
            black_box(dest);
        })
    });
}

fn benchmark_job_channel(c: &mut Criterion) {
    use dotmill::job::RenderJob;

    c.bench_function("job_channel_send_recv", |b| {
        let (tx, rx) = flume::bounded::<RenderJob>(1024);

        b.iter(|| {
            let job = RenderJob::new(PathBuf::from("intro"), "a.dot".into(), 1024);
            tx.send(job).unwrap();
            let received = rx.recv().unwrap();
            black_box(received);
        })
    });
}

criterion_group!(benches, benchmark_dest_path_mapping, benchmark_job_channel);
criterion_main!(benches);
