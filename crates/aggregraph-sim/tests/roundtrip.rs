//! Pack then unpack must preserve the identity structure of any record
//! graph the generator can build.

use aggregraph_core::{ExecutionMode, PackConfig, pack, unpack};
use aggregraph_core::batch::{pack_batch, unpack_batch};
use aggregraph_sim::{GeneratorConfig, check_roundtrip, generate_records, run_campaign};
use proptest::prelude::*;

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(128))]

    #[test]
    fn generated_graphs_survive_round_trip(
        seed in any::<u64>(),
        records in 1usize..120,
        share_percent in 0u8..=100,
        self_percent in 0u8..=100,
    ) {
        let config = GeneratorConfig { records, max_fields: 3, share_percent, self_percent, seed };
        let (arena, root) = generate_records(config);
        let pack_config = PackConfig::default();

        let packed = pack(&arena, root, &pack_config).expect("generated graphs pack");
        let unpacked = unpack(&packed, &pack_config).expect("packed graphs unpack");

        prop_assert_eq!(unpacked.arena.len(), arena.len());
        prop_assert_eq!(check_roundtrip(&arena, root, &unpacked.arena, unpacked.root), Ok(()));
    }

    #[test]
    fn repacking_is_stable(seed in any::<u64>()) {
        let (arena, root) = generate_records(GeneratorConfig { seed, ..GeneratorConfig::default() });
        let config = PackConfig::default();
        let packed = pack(&arena, root, &config).expect("pack");
        let unpacked = unpack(&packed, &config).expect("unpack");
        let repacked = pack(&unpacked.arena, unpacked.root, &config).expect("repack");
        prop_assert_eq!(packed, repacked);
    }
}

#[test]
fn campaign_over_fixed_seeds_passes() {
    let report = run_campaign(0..25, &GeneratorConfig::default(), &PackConfig::default())
        .expect("campaign runs");
    assert_eq!(report.seeds, 25);
    assert_eq!(report.first_failure, None);
}

#[test]
fn parallel_batch_matches_sequential() {
    let graphs: Vec<_> = (0..16)
        .map(|seed| generate_records(GeneratorConfig { seed, ..GeneratorConfig::default() }))
        .collect();
    let jobs: Vec<_> = graphs.iter().map(|(arena, root)| (arena, *root)).collect();
    let config = PackConfig::default();

    let sequential = pack_batch(&jobs, &config, ExecutionMode::Sequential);
    let parallel = pack_batch(&jobs, &config, ExecutionMode::Parallel { workers: 4 });
    assert_eq!(sequential, parallel);

    let documents: Vec<_> = sequential.into_iter().map(|r| r.expect("pack")).collect();
    for (unpacked, (arena, root)) in unpack_batch(&documents, &config, ExecutionMode::Parallel { workers: 3 })
        .into_iter()
        .zip(&graphs)
    {
        let unpacked = unpacked.expect("unpack");
        assert_eq!(check_roundtrip(arena, *root, &unpacked.arena, unpacked.root), Ok(()));
    }
}

/// Packed documents of large graphs nest as deep as the pack walk went, and
/// dropping a `serde_json::Value` recurses, so the test body gets a big stack.
fn with_deep_stack(f: impl FnOnce() + Send + 'static) {
    std::thread::Builder::new()
        .stack_size(256 * 1024 * 1024)
        .spawn(f)
        .expect("spawn test thread")
        .join()
        .expect("test thread panicked");
}

#[test]
fn five_thousand_record_graphs_round_trip() {
    with_deep_stack(|| {
        for seed in [1, 7, 42] {
            let config = GeneratorConfig {
                records: 5_000,
                seed,
                ..GeneratorConfig::default()
            };
            let (arena, root) = generate_records(config);
            let pack_config = PackConfig::default();

            let packed = pack(&arena, root, &pack_config).expect("large graphs pack");
            let unpacked = unpack(&packed, &pack_config).expect("large graphs unpack");

            assert_eq!(unpacked.arena.len(), arena.len(), "seed {seed}");
            assert_eq!(
                check_roundtrip(&arena, root, &unpacked.arena, unpacked.root),
                Ok(()),
                "seed {seed}"
            );
        }
    });
}
