use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::{rngs::StdRng, Rng, SeedableRng};

use colset::{resolve, DataTable, Selection, SharedTable, SliceSpec, UnitContext};

fn wide_table(n: usize) -> SharedTable {
    let names: Vec<String> = (0..n).map(|i| format!("col_{:05}", i)).collect();
    Arc::new(DataTable::from_names(&names))
}

fn bench_resolve(c: &mut Criterion) {
    let ns = [100usize, 10_000usize];
    let mut group = c.benchmark_group("resolve");
    group.sample_size(30);

    for &n in &ns {
        let t = wide_table(n);
        let mut rng = StdRng::seed_from_u64(0xC015_E7);
        let picks: Vec<Selection> = (0..n / 2)
            .map(|_| Selection::Name(format!("col_{:05}", rng.gen_range(0..n))))
            .collect();
        let by_name = Selection::List(picks);
        let last = format!("col_{:05}", n - 1);
        let reversed = Selection::from(SliceSpec::names(Some(last.as_str()), Some("col_00000")));
        let mixed = Selection::List(vec![SliceSpec::range(None, None, Some(2)).into(), Selection::from(-1)]);

        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("names_list", n), &n, |b, _| {
            b.iter(|| resolve(&by_name, &t).expect("resolve names"))
        });
        group.bench_with_input(BenchmarkId::new("reversed_name_slice", n), &n, |b, _| {
            b.iter(|| resolve(&reversed, &t).expect("resolve slice"))
        });
        group.bench_with_input(BenchmarkId::new("expanded_strided_slice", n), &n, |b, _| {
            b.iter(|| resolve(&mixed, &t).expect("resolve mixed"))
        });
        group.bench_with_input(BenchmarkId::new("view_routine_call", n), &n, |b, _| {
            let cs = resolve(&Selection::All, &t).expect("resolve all");
            let mut ctx = UnitContext::new();
            let view = cs.as_view().expect("view");
            let name = view.routine_name(&mut ctx);
            let routine = view.routine(&name);
            b.iter(|| routine.call().expect("materialize"))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
