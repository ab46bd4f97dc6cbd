use std::collections::BTreeSet;

use geoprep::coco::DatasetInfo;
use geoprep::link::TileLinks;
use geoprep::overlay::clip_labels;
use geoprep::pipeline::{DocumentTemplate, PreparedDataset};
use geoprep::split::{SplitKind, SplitProportions};
use geoprep::validation::validate_document;
use proptest::prelude::*;

mod proptest_helpers;

use proptest_helpers::TILE_PIXELS;

fn template() -> DocumentTemplate {
    DocumentTemplate {
        info: DatasetInfo::default(),
        license_name: "On Demand (STDL)".into(),
        license_url: None,
        supercategory: Some("building".into()),
        category: "roof".into(),
        image_dir: None,
    }
}

fn arb_scene() -> impl Strategy<Value = (u32, u32, Vec<geoprep::label::Label>)> {
    proptest_helpers::arb_grid().prop_flat_map(|(cols, rows)| {
        (
            Just(cols),
            Just(rows),
            proptest_helpers::arb_grid_labels(cols, rows, 12),
        )
    })
}

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn clipped_fragments_stay_inside_their_tile((cols, rows, extra) in arb_scene()) {
        let registry = proptest_helpers::grid_registry(cols, rows);
        let fragments = clip_labels(&registry, &extra);

        for fragment in &fragments {
            let name = fragment.tile.as_deref().expect("clipped fragments name a tile");
            let index = registry.position(name).expect("known tile");
            let tile = registry.get(index).unwrap();
            let envelope = fragment.geometry.envelope().expect("non-empty fragment");
            prop_assert!(tile.extent().contains(&envelope), "{:?} leaves {}", envelope, name);
        }
    }

    #[test]
    fn every_link_points_at_a_tile_the_fragment_touches((cols, rows, extra) in arb_scene()) {
        let registry = proptest_helpers::grid_registry(cols, rows);
        let fragments = clip_labels(&registry, &extra);
        let links = TileLinks::group(&registry, &fragments);

        prop_assert_eq!(links.link_count(), fragments.len());
        for (tile_index, fragment) in links.iter() {
            let tile = registry.get(tile_index).unwrap();
            let fragment = &fragments[fragment.index()];
            prop_assert_eq!(fragment.tile.as_deref(), Some(tile.file_name()));
        }
    }

    #[test]
    fn documents_cover_every_tile_once_and_validate(
        (cols, rows, extra) in arb_scene(),
        seed in any::<u32>(),
        (train, test) in proptest_helpers::arb_proportions(),
    ) {
        let registry = proptest_helpers::grid_registry(cols, rows);
        let mut labels = proptest_helpers::seed_labels(cols, rows);
        labels.extend(extra);
        let proportions = SplitProportions::new(train, test).expect("valid proportions");

        let prepared = PreparedDataset::new(registry, labels, true, seed, proportions)
            .expect("no orphan with seed labels");

        let mut files = BTreeSet::new();
        let mut annotations = 0;
        for kind in SplitKind::ALL {
            let document = prepared.document(kind, &template()).expect("build document");
            let res = proptest_helpers::assert_valid_references(&document);
            prop_assert!(res.is_ok(), "{}", res.unwrap_err());

            let report = validate_document(&document);
            prop_assert_eq!(report.error_count(), 0, "{}", report);

            for image in &document.images {
                prop_assert_eq!((image.width, image.height), (TILE_PIXELS, TILE_PIXELS));
                prop_assert!(files.insert(image.file_name.clone()), "{} twice", image.file_name);
            }
            annotations += document.annotations.len();
        }

        prop_assert_eq!(files.len(), prepared.registry.len());
        prop_assert_eq!(annotations, prepared.fragments.len());
    }
}
