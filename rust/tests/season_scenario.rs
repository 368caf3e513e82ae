use crate::allocation::{DatedItem, PeriodAllocator};
use crate::calendars::{blocks, nd, PeriodTaxonomy};
use crate::seasons::{SeasonBranchModel, SeasonConfig, SeasonInput, Transfer};
use crate::tests::{fixture_model_config, is_close};
use chrono::Duration;

fn fixture_two_seasons() -> SeasonBranchModel {
    let start = nd(2021, 4, 1);
    let season = |name: &str, day: i64| SeasonInput {
        name: name.to_string(),
        initiation: start + Duration::days(day),
        probability: 0.5,
        active: true,
    };
    SeasonBranchModel::from_config(&SeasonConfig {
        season_start: start,
        steady_state: false,
        seasons: vec![season("z0", 0), season("z1", 90)],
    })
    .unwrap()
}

#[test]
fn two_season_year() {
    let model = fixture_two_seasons();
    let tax = PeriodTaxonomy::try_new("p7", blocks(nd(2021, 4, 1), 30, 12)).unwrap();

    assert!((0..12).all(|p| model.is_identified(0, &tax, p)));
    // blocks 0..=2 end on or before day 90
    assert!((0..3).all(|p| !model.is_identified(1, &tax, p)));
    assert!((3..12).all(|p| model.is_identified(1, &tax, p)));
    assert_eq!(model.parent(1), 0);
    assert_eq!(model.parent(0), 0);

    let masks = model.transfer_masks(&tax);
    // z0 branches into z1 at the end of the block before identification
    assert!(masks.provide_within[[2, 0, 1]]);
    assert!(!masks.provide_within[[1, 0, 1]]);
    assert!(!masks.require[[2, 1, 1]]);
    // from then on z1 requires from and provides to itself
    assert!(masks.require[[3, 1, 1]]);
    assert!(masks.provide_within[[3, 1, 1]]);
    assert!(!masks.provide_within[[3, 0, 1]]);

    // every season provides into the root of the next year
    let between = masks.transfer_mask(11, Transfer::Provide);
    assert!(between[[0, 0]] && between[[1, 0]]);
    assert!(!between[[0, 1]] && !between[[1, 1]]);

    // within and between provision never overlap
    assert!(masks
        .provide_within
        .iter()
        .zip(masks.provide_between.iter())
        .all(|(w, b)| !(*w && *b)));
}

#[test]
fn default_seasons_identify_monotonically() {
    let config = fixture_model_config();
    let model = config.season_model().unwrap();
    for tax in [&config.calendar.phase, &config.calendar.season, &config.calendar.labour] {
        let identified = model.identification(tax);
        for z in 0..model.len() {
            assert!((1..tax.len()).all(|p| !identified[[p - 1, z]] || identified[[p, z]]));
        }
    }
    assert_eq!(model.identification_period(1, &config.calendar.phase), Some(1));
    assert_eq!(model.identification_period(2, &config.calendar.phase), Some(2));
}

#[test]
fn default_labour_allocation_conserves_mass() {
    let config = fixture_model_config();
    let allocator = PeriodAllocator::new(&config.calendar.labour);
    let items = [
        DatedItem::new(nd(2021, 5, 10), 30),
        DatedItem::new(nd(2019, 12, 20), 20),
        DatedItem::point(nd(2022, 3, 31)),
    ];
    let table = allocator.allocate_items(&items).unwrap();
    for i in 0..items.len() {
        let item = table.item(i);
        assert!(is_close(&item.sum(), &1.0, None));
        assert!(item.iter().all(|v| (0.0..=1.0).contains(v)));
    }
    assert_eq!(table.get(11, 2), 1.0);
}
