use geoprep::geo::{Coord, Extent, GeoTransform, Geographic, PixelMapper, PixelRing};
use proptest::prelude::*;

mod proptest_helpers;

fn arb_tile() -> impl Strategy<Value = (GeoTransform, u32, u32)> {
    (
        2_480_000.0..2_840_000.0f64,
        1_070_000.0..1_300_000.0f64,
        prop::sample::select(vec![0.1, 0.25, 0.5, 1.0, 2.0]),
        16u32..2048,
        16u32..2048,
    )
        .prop_map(|(left, top, resolution, width, height)| {
            (
                GeoTransform::new([left, resolution, 0.0, top, 0.0, -resolution]),
                width,
                height,
            )
        })
}

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn points_inside_the_footprint_land_inside_the_image(
        (transform, width, height) in arb_tile(),
        u in 0.0..=1.0f64,
        v in 0.0..=1.0f64,
    ) {
        let extent = transform.footprint(width, height);
        let mapper = PixelMapper::new(extent, width, height);
        let point: Coord<Geographic> = Coord::new(
            extent.xmin() + u * extent.width(),
            extent.ymin() + v * extent.height(),
        );

        let pixel = mapper.to_pixel_checked(&point);
        prop_assert!(pixel.is_some(), "{:?} fell outside {:?}", point, extent);
        let pixel = pixel.unwrap();
        prop_assert!((0.0..=f64::from(width)).contains(&pixel.x));
        prop_assert!((0.0..=f64::from(height)).contains(&pixel.y));
    }

    #[test]
    fn north_maps_to_the_top_row(
        (transform, width, height) in arb_tile(),
        u in 0.0..=1.0f64,
    ) {
        let extent = transform.footprint(width, height);
        let mapper = PixelMapper::new(extent, width, height);
        let north: Coord<Geographic> = Coord::new(extent.xmin() + u * extent.width(), extent.ymax());
        let south: Coord<Geographic> = Coord::new(extent.xmin() + u * extent.width(), extent.ymin());

        prop_assert!(mapper.to_pixel(&north).y.abs() < 1e-6);
        prop_assert!((mapper.to_pixel(&south).y - f64::from(height)).abs() < 1e-6);
    }

    #[test]
    fn ring_area_scales_with_resolution(
        (transform, width, height) in arb_tile(),
        (u0, u1) in (0.0..0.5f64, 0.5..=1.0f64),
        (v0, v1) in (0.0..0.5f64, 0.5..=1.0f64),
    ) {
        let extent = transform.footprint(width, height);
        let mapper = PixelMapper::new(extent, width, height);
        let x0 = extent.xmin() + u0 * extent.width();
        let x1 = extent.xmin() + u1 * extent.width();
        let y0 = extent.ymin() + v0 * extent.height();
        let y1 = extent.ymin() + v1 * extent.height();
        let ring: Vec<Coord<Geographic>> = vec![
            Coord::new(x0, y0),
            Coord::new(x1, y0),
            Coord::new(x1, y1),
            Coord::new(x0, y1),
            Coord::new(x0, y0),
        ];

        let pixels: PixelRing = mapper.map_ring(&ring).expect("ring inside the tile");
        let resolution = transform.0[1];
        let expected = (x1 - x0) * (y1 - y0) / (resolution * resolution);
        prop_assert!((pixels.area() - expected).abs() <= expected * 1e-6 + 1e-6);

        let bbox: Extent<_> = pixels.extent();
        prop_assert!(bbox.xmin() >= 0.0 && bbox.ymin() >= 0.0);
        prop_assert!(bbox.xmax() <= f64::from(width) && bbox.ymax() <= f64::from(height));
    }
}
