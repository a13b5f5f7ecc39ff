use criterion::BenchmarkGroup;
use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use proclet::lang::LocalRank;
use proclet::lang::Pid;
use proclet::node::WorldLayout;
use proclet::rtw::ArrayMap;
use proclet::rtw::CompressedMap;
use proclet::rtw::HashedMap;
use proclet::rtw::LeaderPolicy;
use proclet::rtw::RtwMap;
use std::hint::black_box;

const WORLDS: &[u32] = &[64, 1024, 16384];
const PER_PROC: u32 = 16;

fn layout(size: u32) -> WorldLayout {
  WorldLayout::uniform(size / PER_PROC, PER_PROC).unwrap()
}

fn bench_strategy<M>(criterion: &mut Criterion)
where
  M: RtwMap,
{
  let mut group: BenchmarkGroup<_> = criterion.benchmark_group(M::STRATEGY);

  for &size in WORLDS {
    let world: WorldLayout = layout(size);

    group.bench_with_input(BenchmarkId::new("create_for_world", size), &world, |bench, world| {
      bench.iter(|| black_box(M::create_for_world(world)));
    });

    let map: M = M::create_for_world(&world);

    group.bench_with_input(BenchmarkId::new("find", size), &map, |bench, map| {
      bench.iter(|| {
        for rank in (0..size).step_by(7) {
          black_box(map.find(LocalRank::new(rank)).ok());
        }
      });
    });

    group.bench_with_input(BenchmarkId::new("find_leader", size), &map, |bench, map| {
      let pid: Pid = Pid::new(world.num_procs() - 1);

      bench.iter(|| black_box(map.find_leader(pid, LeaderPolicy::LowestLocalRank).ok()));
    });
  }

  group.finish();
}

fn bench_rtw_map(criterion: &mut Criterion) {
  bench_strategy::<ArrayMap>(criterion);
  bench_strategy::<HashedMap>(criterion);
  bench_strategy::<CompressedMap>(criterion);
}

criterion_group!(benches, bench_rtw_map);
criterion_main!(benches);
