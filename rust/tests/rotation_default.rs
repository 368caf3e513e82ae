use crate::binder::{PhaseItem, RotationPeriodBinder};
use crate::allocation::DatedItem;
use crate::calendars::nd;
use crate::rotations::{RotationCache, RotationGenerator};
use crate::tests::fixture_model_config;
use indexmap::IndexSet;

#[test]
fn default_rotation_counts() {
    crate::logging::init_test();
    let config = fixture_model_config();
    let set = RotationGenerator::try_new(&config.rotation)
        .unwrap()
        .generate()
        .unwrap();
    assert_eq!(set.phases.len(), 3108);
    assert_eq!(set.histories.len(), 339);
    assert_eq!(set.relation.requires().len(), 6594);
    assert_eq!(set.relation.provides().len(), 6257);
    let keys = set.phase_keys();
    assert_eq!(keys[0], "AANEARz");
    assert_eq!(keys[keys.len() - 1], "YYAMSm");
    // phase identities are unique
    assert_eq!(keys.iter().collect::<IndexSet<_>>().len(), keys.len());
}

#[test]
fn default_rules_filter_incrementally() {
    let config = fixture_model_config();
    let gen = RotationGenerator::try_new(&config.rotation).unwrap();
    assert_eq!(gen.enumerate(), gen.enumerate_exhaustive());
}

#[test]
fn default_phases_have_no_fifth_annual_year() {
    let config = fixture_model_config();
    let phases = RotationGenerator::try_new(&config.rotation)
        .unwrap()
        .phases()
        .unwrap();
    let annual = ["A", "AR", "M"];
    let spraytopped = ["A", "AR", "M", "a", "ar", "m"];
    assert!(!phases.iter().any(|p| {
        let slots: Vec<&str> = p.slots().iter().map(|lu| lu.name()).collect();
        slots[1..5].iter().all(|s| annual.contains(s)) && spraytopped.contains(&slots[5])
    }));
}

#[test]
fn default_binder() {
    let config = fixture_model_config();
    let set = RotationGenerator::try_new(&config.rotation)
        .unwrap()
        .generate()
        .unwrap();
    let seasons = config.season_model().unwrap();
    let binder =
        RotationPeriodBinder::try_new(&config.rotation, &set, &seasons, &config.calendar.phase)
            .unwrap();
    let last = config.calendar.phase.len() - 1;
    assert_eq!(binder.dry_sow_carry().column(last).sum(), 578.0);
    assert_eq!(
        binder.dry_sow_carry().column(0).sum(),
        set.phases.len() as f64
    );

    // the root season is identified throughout, so every phase requires area in every period
    for m in 0..config.calendar.phase.len() {
        let required: IndexSet<usize> = binder
            .area_transfer(m)
            .iter()
            .filter(|t| t.coefficient > 0.0)
            .map(|t| t.phase)
            .collect();
        assert_eq!(required.len(), set.phases.len());
    }

    let items = [PhaseItem {
        phase: 0,
        item: DatedItem::new(nd(2021, 4, 1), 44),
        amount: 100.0,
    }];
    let commitment = binder.item_commitment(&items).unwrap();
    assert_eq!(commitment[[0, 0]], 0.0);
    assert!(crate::tests::is_close(&commitment[[0, 1]], &100.0, None));
    assert!(crate::tests::is_close(&commitment[[0, 5]], &100.0, None));
}

#[test]
fn default_rotation_cache() {
    let config = fixture_model_config();
    let dir = tempfile::tempdir().unwrap();
    let cache = RotationCache::new(dir.path().join("rotations.bin"));
    let generated = cache
        .load_or_generate(&config.rotation, None, false)
        .unwrap();
    let loaded = cache.load(&config.rotation, None).unwrap().unwrap();
    assert_eq!(loaded, generated);
}
