// Chart rendering and aggregation benchmarks
// Author: kelexine (https://github.com/kelexine)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use langstats::chart::{render_chart, ChartKind, RenderOptions};
use langstats::languages::{select, summarize};
use langstats::models::{AggregateOptions, LanguageHistogram, SubjectProfile};

const LANGUAGES: [&str; 12] = [
    "Rust", "Go", "Python", "TypeScript", "JavaScript", "C", "C++", "Shell", "Nix", "Lua",
    "HTML", "CSS",
];

fn histograms(repositories: usize) -> Vec<LanguageHistogram> {
    (0..repositories)
        .map(|i| {
            let languages = LANGUAGES
                .iter()
                .enumerate()
                .filter(|(j, _)| (i + j) % 3 != 0)
                .map(|(j, name)| (name.to_string(), ((i + 1) * (j + 7) * 1013) as u64))
                .collect();
            LanguageHistogram::new(format!("repo{}", i), languages)
        })
        .collect()
}

fn bench_summarize(c: &mut Criterion) {
    let mut group = c.benchmark_group("summarize");
    for repositories in [10, 100, 300] {
        let input = histograms(repositories);
        group.bench_with_input(BenchmarkId::from_parameter(repositories), &input, |b, input| {
            b.iter(|| summarize(black_box(input), SubjectProfile::default()))
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let summary = summarize(&histograms(100), SubjectProfile::default());
    let report = select(&summary, &AggregateOptions::default());

    let mut group = c.benchmark_group("render_chart");
    for kind in [ChartKind::Donut, ChartKind::Pie, ChartKind::Bar] {
        let options = RenderOptions {
            kind,
            ..RenderOptions::default()
        };
        group.bench_with_input(BenchmarkId::from_parameter(kind), &options, |b, options| {
            b.iter(|| render_chart(black_box(&report), options, None))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_summarize, bench_render);
criterion_main!(benches);
