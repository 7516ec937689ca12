//! Integration tests for the raster stages: read, mask, preview and bounds

use geo::{polygon, MultiPolygon};
use geoclip_core::models::{Boundary, Crs};
use geoclip_geo::geo_bounds;
use geoclip_raster::{read_geotiff, render_preview, write_geotiff, write_preview, Affine, Raster, RasterClipper, SampleType};
use proptest::prelude::*;

/// 1x1 degree raster over the unit square, 4x4 pixels with a gradient
fn unit_raster() -> Raster {
    Raster::new(
        1,
        4,
        4,
        SampleType::U8,
        (0..16).map(|v| f64::from(v * 10 + 5)).collect(),
        Affine::north_up(0.0, 1.0, 0.25, 0.25),
        Some(Crs::wgs84()),
        None,
    )
    .unwrap()
}

fn unit_square() -> Boundary {
    Boundary::new(
        MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0),
        ]]),
        Crs::wgs84(),
    )
}

#[test]
fn test_unit_square_clip_bounds_and_preview() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.tif");
    let clipped_path = dir.path().join("clipped.tif");
    let preview_path = dir.path().join("clipped.png");

    write_geotiff(&unit_raster(), &source).unwrap();
    let raster = read_geotiff(&source).unwrap();

    let clipped = RasterClipper::new().clip(&unit_square(), &raster).unwrap();
    write_geotiff(&clipped, &clipped_path).unwrap();

    let reread = read_geotiff(&clipped_path).unwrap();
    assert_eq!((reread.width(), reread.height()), (4, 4));
    assert_eq!(reread.data(), unit_raster().data());

    let bounds = geo_bounds(&reread.extent(), reread.crs().unwrap(), &Crs::wgs84()).unwrap();
    assert!((bounds.north - 1.0).abs() < 1e-9);
    assert!((bounds.south - 0.0).abs() < 1e-9);
    assert!((bounds.east - 1.0).abs() < 1e-9);
    assert!((bounds.west - 0.0).abs() < 1e-9);

    let dims = write_preview(&reread, &preview_path).unwrap();
    assert_eq!(dims, (4, 4));
}

#[test]
fn test_utm_raster_clipped_by_wgs84_boundary() {
    // 100 m pixels in UTM 48S around (106.8E, 6.2S)
    let raster = Raster::new(
        1,
        20,
        20,
        SampleType::F32,
        vec![1.0; 400],
        Affine::north_up(700_000.0, 9_315_000.0, 100.0, 100.0),
        Some(Crs::from_epsg(32748)),
        Some(-1.0),
    )
    .unwrap();

    let extent = raster.extent();
    let wgs = geo_bounds(&extent, &Crs::from_epsg(32748), &Crs::wgs84()).unwrap();
    let mid_lon = (wgs.west + wgs.east) / 2.0;
    let mid_lat = (wgs.south + wgs.north) / 2.0;

    // Boundary covering the south-west quarter
    let boundary = Boundary::new(
        MultiPolygon::new(vec![polygon![
            (x: wgs.west - 1.0, y: wgs.south - 1.0),
            (x: mid_lon, y: wgs.south - 1.0),
            (x: mid_lon, y: mid_lat),
            (x: wgs.west - 1.0, y: mid_lat),
        ]]),
        Crs::wgs84(),
    );

    let clipped = RasterClipper::new().clip(&boundary, &raster).unwrap();

    assert!(clipped.width() <= 11 && clipped.width() >= 9);
    assert!(clipped.height() <= 11 && clipped.height() >= 9);
    assert_eq!(clipped.crs().and_then(|c| c.epsg), Some(32748));
    assert!(clipped.data().iter().all(|v| *v == 1.0 || *v == -1.0));
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 48,
        ..ProptestConfig::default()
    })]

    /// Property: the preview always has the clipped raster's dimensions
    #[test]
    fn preview_matches_clipped_dimensions(
        x0 in -0.5f64..1.5,
        y0 in -0.5f64..1.5,
        w in 0.01f64..1.5,
        h in 0.01f64..1.5,
    ) {
        let boundary = Boundary::new(
            MultiPolygon::new(vec![polygon![
                (x: x0, y: y0),
                (x: x0 + w, y: y0),
                (x: x0 + w, y: y0 + h),
                (x: x0, y: y0 + h),
            ]]),
            Crs::wgs84(),
        );

        let clipped = RasterClipper::new().clip(&boundary, &unit_raster()).unwrap();
        let preview = render_preview(&clipped).unwrap();

        prop_assert_eq!(preview.dimensions(), (clipped.width() as u32, clipped.height() as u32));
        prop_assert!(clipped.width() >= 1 && clipped.height() >= 1);
    }
}
