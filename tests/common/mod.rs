#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;

pub const LV95_WKT: &str = r#"PROJCS["CH1903+ / LV95",GEOGCS["CH1903+",DATUM["CH1903+",SPHEROID["Bessel 1841",6377397.155,299.1528128,AUTHORITY["EPSG","7004"]],AUTHORITY["EPSG","6150"]],PRIMEM["Greenwich",0,AUTHORITY["EPSG","8901"]],UNIT["degree",0.0174532925199433,AUTHORITY["EPSG","9122"]],AUTHORITY["EPSG","4150"]],PROJECTION["Hotine_Oblique_Mercator_Azimuth_Center"],UNIT["metre",1,AUTHORITY["EPSG","9001"]],AUTHORITY["EPSG","2056"]]"#;

pub const LV03_WKT: &str = r#"PROJCS["CH1903 / LV03",GEOGCS["CH1903",DATUM["CH1903",SPHEROID["Bessel 1841",6377397.155,299.1528128]],PRIMEM["Greenwich",0],UNIT["degree",0.0174532925199433]],PROJECTION["Hotine_Oblique_Mercator_Azimuth_Center"],UNIT["metre",1],AUTHORITY["EPSG","21781"]]"#;

/// Value of one IFD entry.
#[derive(Clone, Debug)]
pub enum TagValue {
    Short(Vec<u16>),
    Long(u32),
    Double(Vec<f64>),
}

impl TagValue {
    /// `(field type, count, little-endian payload)`.
    fn encode(&self) -> (u16, u32, Vec<u8>) {
        match self {
            TagValue::Short(v) => (3, v.len() as u32, v.iter().flat_map(|x| x.to_le_bytes()).collect()),
            TagValue::Long(v) => (4, 1, v.to_le_bytes().to_vec()),
            TagValue::Double(v) => (12, v.len() as u32, v.iter().flat_map(|x| x.to_le_bytes()).collect()),
        }
    }
}

/// Uncompressed 8-bit grayscale little-endian TIFF in a single strip, with
/// `extra` tags added to its IFD.
pub fn tiff_bytes(width: u32, height: u32, extra: &[(u16, TagValue)]) -> Vec<u8> {
    let pixels = width * height;
    let mut tags = vec![
        (256, TagValue::Long(width)),
        (257, TagValue::Long(height)),
        (258, TagValue::Short(vec![8])),
        (259, TagValue::Short(vec![1])),
        (262, TagValue::Short(vec![1])),
        (273, TagValue::Long(0)),
        (277, TagValue::Short(vec![1])),
        (278, TagValue::Long(height)),
        (279, TagValue::Long(pixels)),
    ];
    tags.extend(extra.iter().cloned());
    tags.sort_by_key(|(tag, _)| *tag);

    let ifd_len = 2 + 12 * tags.len() + 4;
    let overflow: usize = tags
        .iter()
        .map(|(_, value)| value.encode().2.len())
        .filter(|&len| len > 4)
        .sum();
    let data_offset = 8 + ifd_len + overflow;
    for (tag, value) in &mut tags {
        if *tag == 273 {
            *value = TagValue::Long(data_offset as u32);
        }
    }

    let mut bytes = Vec::with_capacity(data_offset + pixels as usize);
    bytes.extend_from_slice(b"II");
    bytes.extend_from_slice(&42u16.to_le_bytes());
    bytes.extend_from_slice(&8u32.to_le_bytes());
    bytes.extend_from_slice(&(tags.len() as u16).to_le_bytes());

    let mut data = Vec::with_capacity(overflow);
    for (tag, value) in &tags {
        let (kind, count, mut payload) = value.encode();
        bytes.extend_from_slice(&tag.to_le_bytes());
        bytes.extend_from_slice(&kind.to_le_bytes());
        bytes.extend_from_slice(&count.to_le_bytes());
        if payload.len() <= 4 {
            payload.resize(4, 0);
            bytes.extend_from_slice(&payload);
        } else {
            bytes.extend_from_slice(&((8 + ifd_len + data.len()) as u32).to_le_bytes());
            data.extend_from_slice(&payload);
        }
    }
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&data);

    bytes.resize(data_offset + pixels as usize, 0);
    bytes
}

/// GeoTIFF tags placing the upper-left corner at `origin`, pixel-is-area.
pub fn geotiff_tags(origin: (f64, f64), pixel: f64, epsg: u16) -> Vec<(u16, TagValue)> {
    vec![
        (33550, TagValue::Double(vec![pixel, pixel, 0.0])),
        (33922, TagValue::Double(vec![0.0, 0.0, 0.0, origin.0, origin.1, 0.0])),
        (
            34735,
            TagValue::Short(vec![1, 1, 0, 3, 1024, 0, 1, 1, 1025, 0, 1, 1, 3072, 0, 1, epsg]),
        ),
    ]
}

/// Writes `name` with its world file and projection. The world file
/// references the centre of the top-left pixel.
pub fn write_tile(dir: &Path, name: &str, origin: (f64, f64), pixel: f64, size: u32, wkt: &str) {
    fs::create_dir_all(dir).expect("create tile dir");
    let path = dir.join(name);
    fs::write(&path, tiff_bytes(size, size, &[])).expect("write tiff");

    let world = format!(
        "{pixel}\n0\n0\n{}\n{}\n{}\n",
        -pixel,
        origin.0 + pixel / 2.0,
        origin.1 - pixel / 2.0
    );
    fs::write(path.with_extension("tfw"), world).expect("write world file");
    fs::write(path.with_extension("prj"), wkt).expect("write prj");
}

/// Writes `name` as a GeoTIFF carrying its own georeferencing, without
/// sidecars.
pub fn write_geotiff(dir: &Path, name: &str, origin: (f64, f64), pixel: f64, size: u32, epsg: u16) {
    fs::create_dir_all(dir).expect("create tile dir");
    let bytes = tiff_bytes(size, size, &geotiff_tags(origin, pixel, epsg));
    fs::write(dir.join(name), bytes).expect("write geotiff");
}

pub fn square(x: f64, y: f64, size: f64) -> serde_json::Value {
    json!([[
        [x, y],
        [x + size, y],
        [x + size, y + size],
        [x, y + size],
        [x, y]
    ]])
}

pub fn write_labels(path: &Path, polygons: &[(&str, serde_json::Value)]) {
    let features: Vec<_> = polygons
        .iter()
        .map(|(id, coordinates)| {
            json!({
                "type": "Feature",
                "properties": {"label_id": id},
                "geometry": {"type": "Polygon", "coordinates": coordinates}
            })
        })
        .collect();
    let collection = json!({"type": "FeatureCollection", "features": features});
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create label dir");
    }
    fs::write(path, serde_json::to_string_pretty(&collection).unwrap()).expect("write labels");
}

/// A dataset of four 100 m tiles (200 px at 0.5 m) in a row along x, with
/// one label straddling the edge between the second and third tile.
pub struct Fixture {
    pub root: tempfile::TempDir,
}

impl Fixture {
    pub fn new() -> Self {
        let fixture = Self {
            root: tempfile::tempdir().expect("create temp dir"),
        };
        for i in 0..4 {
            fixture.add_tile(&format!("tile_{i}.tif"), f64::from(i) * 100.0, LV95_WKT);
        }
        fixture.write_labels(&[
            ("a", square(10.0, 10.0, 20.0)),
            ("b", square(190.0, 40.0, 20.0)),
            ("c", square(250.0, 50.0, 10.0)),
            ("d", square(350.0, 0.0, 50.0)),
        ]);
        fs::write(
            fixture.dataset().join("conformation.txt"),
            "# project region year epsg source level\nstdl geneva 2018 2056 ortho 18\n",
        )
        .expect("write conformation");
        fixture.write_config(false);
        fixture
    }

    pub fn dataset(&self) -> PathBuf {
        self.root.path().join("dataset")
    }

    pub fn working(&self) -> PathBuf {
        self.root.path().join("working")
    }

    pub fn entry_dir(&self) -> PathBuf {
        self.dataset().join("stdl/geneva/2018/2056")
    }

    pub fn tile_dir(&self) -> PathBuf {
        self.entry_dir().join("tile/ortho/geotiff/18")
    }

    pub fn output_dir(&self) -> PathBuf {
        self.working().join("stdl_geneva_2018_2056_ortho_18")
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.path().join("config.yaml")
    }

    pub fn add_tile(&self, name: &str, x: f64, wkt: &str) {
        write_tile(&self.tile_dir(), name, (x, 100.0), 0.5, 200, wkt);
    }

    /// Replaces the tile with a sidecar-free GeoTIFF.
    pub fn add_embedded_tile(&self, name: &str, x: f64, epsg: u16) {
        let path = self.tile_dir().join(name);
        for sidecar in ["tfw", "prj"] {
            let _ = fs::remove_file(path.with_extension(sidecar));
        }
        write_geotiff(&self.tile_dir(), name, (x, 100.0), 0.5, 200, epsg);
    }

    pub fn write_labels(&self, polygons: &[(&str, serde_json::Value)]) {
        write_labels(&self.entry_dir().join("label/label.geojson"), polygons);
    }

    pub fn write_config(&self, debug: bool) {
        let yaml = format!(
            "common:\n  debug: {debug}\n  working: {working}\n  class: building\n  category: roof\n\
             prepare:\n  dataset: {dataset}\n  conformation: conformation.txt\n  split_seed: 42\n  split_prop: [0.5, 0.25]\n",
            working = self.working().display(),
            dataset = self.dataset().display(),
        );
        fs::write(self.config_path(), yaml).expect("write config");
    }
}
