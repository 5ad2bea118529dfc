use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rdo_core::{compile, ForbiddenAction, RuleIntent};
use rdo_testkit::vectors::all_vectors;
use rdo_testkit::FIXTURE_EPOCH;

fn bench_compile(c: &mut Criterion) {
    let intent = RuleIntent::message("memo", "quarterly numbers attached")
        .forbid(ForbiddenAction::Forward)
        .forbid(ForbiddenAction::Copy)
        .expires_in(86_400)
        .max_uses(10);

    c.bench_function("compile_message", |b| {
        b.iter(|| compile(black_box(&intent), black_box(FIXTURE_EPOCH)))
    });

    let large = RuleIntent::message("bulk", "x".repeat(64 * 1024));
    c.bench_function("compile_64k_message", |b| {
        b.iter(|| compile(black_box(&large), black_box(FIXTURE_EPOCH)))
    });

    let intents: Vec<_> = all_vectors().iter().map(|v| ((v.intent)(), v.now)).collect();
    c.bench_function("compile_golden_vectors", |b| {
        b.iter(|| {
            for (intent, now) in &intents {
                black_box(compile(intent, *now));
            }
        })
    });
}

fn bench_digest(c: &mut Criterion) {
    let compiled = compile(&RuleIntent::link("l", "https://example.com"), FIXTURE_EPOCH);
    c.bench_function("rule_set_digest", |b| {
        b.iter(|| black_box(compiled.rule_set().digest()))
    });
}

criterion_group!(benches, bench_compile, bench_digest);
criterion_main!(benches);
