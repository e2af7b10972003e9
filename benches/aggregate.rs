use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use housing_insights::{
    GroupBy, TimePeriod, aggregate::Aggregator, cleaner::Cleaner, config::AnalyticsConfig,
    dashboard::build_dashboard, extract_insights, generate,
};

fn bench_pipeline(c: &mut Criterion) {
    let config = AnalyticsConfig::default();
    let raw = generate(&config, 5_000, 42).expect("generate records");
    let records = Cleaner::new(&config).clean(&raw);
    let aggregator = Aggregator::from_config(&config);

    let mut group = c.benchmark_group("analytics");

    group.bench_function("generate_5000", |b| {
        b.iter(|| generate(&config, black_box(5_000), 42).expect("generate"));
    });

    group.bench_function("clean_5000", |b| {
        b.iter_batched(
            || raw.clone(),
            |input| Cleaner::new(&config).clean(&input),
            BatchSize::SmallInput,
        );
    });

    for group_by in [GroupBy::Neighborhood, GroupBy::Segment] {
        group.bench_function(format!("aggregate_{group_by:?}").to_lowercase(), |b| {
            b.iter(|| aggregator.aggregate(black_box(&records), group_by));
        });
    }

    group.bench_function("trend_monthly", |b| {
        b.iter(|| {
            aggregator
                .trend(black_box(&records), TimePeriod::Month, 3)
                .expect("trend")
        });
    });

    group.bench_function("insights", |b| {
        b.iter(|| extract_insights(black_box(&records), &config).expect("insights"));
    });

    group.bench_function("dashboard", |b| {
        b.iter(|| build_dashboard(black_box(&records), &config, TimePeriod::Month).expect("dashboard"));
    });

    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
