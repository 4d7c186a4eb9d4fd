use criterion::{criterion_group, criterion_main, Criterion};

use espprc::explorer::{Explorer, IterationBudget};
use espprc::instance::Instance;
use espprc::lower_bound::{CachingOracle, KnapsackOracle, ZeroOracle};

fn bench_explorer(c: &mut Criterion) {
    let instance = Instance::random(10, 2, 1);
    let graph = instance.build_graph().unwrap();

    c.bench_function("explorer_zero_oracle_10n", |b| {
        b.iter(|| {
            let mut explorer = Explorer::new(&graph, &ZeroOracle);
            explorer.run(f64::INFINITY, IterationBudget::unbounded()).unwrap();
        })
    });

    let oracle = CachingOracle::new(KnapsackOracle, 0.5);
    c.bench_function("explorer_knapsack_oracle_10n", |b| {
        b.iter(|| {
            let mut explorer = Explorer::new(&graph, &oracle);
            explorer.run(f64::INFINITY, IterationBudget::unbounded()).unwrap();
        })
    });
}

criterion_group!(benches, bench_explorer);
criterion_main!(benches);
