//! Reference frames and bounding boxes shared by every geoclip crate.

use serde::{Deserialize, Serialize};

use crate::error::{GeoclipError, Result};

/// Coordinate Reference System.
///
/// `definition` is any string PROJ understands: an `EPSG:xxxx` code or a
/// full WKT document taken from a `.prj` file. `epsg` is filled whenever an
/// authority code could be identified, and is what CRS comparison prefers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crs {
    pub epsg: Option<u32>,
    pub definition: String,
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl Crs {
    /// CRS identified by an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self { epsg: Some(code), definition: format!("EPSG:{}", code) }
    }

    /// WGS 84 (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// Build a CRS from a WKT document (e.g. the content of a `.prj` file).
    ///
    /// The authority code of the root element is used when present, so
    /// `PROJCS[...,AUTHORITY["EPSG","32748"]]` resolves to EPSG:32748 and
    /// not to the datum's code.
    pub fn from_wkt(wkt: &str) -> Self {
        let wkt = wkt.trim().trim_start_matches('\u{feff}');

        if let Some(code) = root_authority_code(wkt) {
            return Self::from_epsg(code);
        }

        if is_plain_wgs84_wkt(wkt) {
            return Self::wgs84();
        }

        Self { epsg: None, definition: wkt.to_string() }
    }

    /// Parse a CRS name as found in GeoJSON `crs` members or user input.
    ///
    /// Accepts `EPSG:4326`, `urn:ogc:def:crs:EPSG::4326`, `OGC:CRS84`,
    /// `urn:ogc:def:crs:OGC:1.3:CRS84` and bare codes.
    pub fn parse(name: &str) -> Result<Self> {
        let name = name.trim();
        let upper = name.to_ascii_uppercase();

        if upper.ends_with("CRS84") {
            return Ok(Self::wgs84());
        }

        let code = upper
            .rsplit(':')
            .next()
            .filter(|_| upper.contains("EPSG") || !upper.contains(':'))
            .and_then(|digits| digits.parse::<u32>().ok());

        code.map(Self::from_epsg).ok_or_else(|| {
            GeoclipError::projection(format!("Unrecognized CRS identifier '{}'", name))
        })
    }

    /// Check whether two CRS refer to the same reference frame
    pub fn same_as(&self, other: &Crs) -> bool {
        match (self.epsg, other.epsg) {
            (Some(a), Some(b)) => a == b,
            _ => self.definition == other.definition,
        }
    }

    pub fn is_wgs84(&self) -> bool {
        self.epsg == Some(4326)
    }

    /// Short human-readable label
    pub fn label(&self) -> String {
        match self.epsg {
            Some(code) => format!("EPSG:{}", code),
            None => {
                let head: String = self.definition.chars().take(48).collect();
                format!("WKT {}...", head)
            }
        }
    }
}

/// Extract the EPSG code attached directly to the root WKT element.
///
/// Handles WKT1 `AUTHORITY["EPSG","4326"]` and WKT2 `ID["EPSG",4326]`.
fn root_authority_code(wkt: &str) -> Option<u32> {
    let bytes = wkt.as_bytes();
    let mut depth = 0usize;
    let mut in_quotes = false;
    let mut found = None;
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if c == b'"' {
            in_quotes = !in_quotes;
        } else if !in_quotes {
            match c {
                b'[' | b'(' => depth += 1,
                b']' | b')' => depth = depth.saturating_sub(1),
                _ if depth == 1 => {
                    let body = wkt
                        .get(i..)
                        .and_then(|rest| rest.strip_prefix("AUTHORITY[").or_else(|| rest.strip_prefix("ID[")));
                    if let Some(body) = body {
                        if let Some(code) = parse_authority_body(body) {
                            found = Some(code);
                        }
                    }
                }
                _ => {}
            }
        }
        i += 1;
    }

    found
}

fn parse_authority_body(body: &str) -> Option<u32> {
    let end = body.find(']')?;
    let mut parts = body[..end].split(',');
    let authority = parts.next()?.trim().trim_matches('"');
    if !authority.eq_ignore_ascii_case("EPSG") {
        return None;
    }
    parts.next()?.trim().trim_matches('"').parse().ok()
}

/// ESRI-flavoured WKT for WGS84 carries no authority code.
fn is_plain_wgs84_wkt(wkt: &str) -> bool {
    let upper = wkt.to_ascii_uppercase();
    upper.starts_with("GEOGCS[")
        && (upper.starts_with("GEOGCS[\"GCS_WGS_1984\"") || upper.starts_with("GEOGCS[\"WGS 84\""))
}

/// Axis-aligned geographic box.
///
/// Always built through [`BoundingBox::from_corners`] so that
/// `north >= south` and `east >= west` hold regardless of corner order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl BoundingBox {
    /// Build a box from two opposite corners given as `(x, y)`
    pub fn from_corners(a: (f64, f64), b: (f64, f64)) -> Self {
        Self {
            north: a.1.max(b.1),
            south: a.1.min(b.1),
            east: a.0.max(b.0),
            west: a.0.min(b.0),
        }
    }

    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_authority_wins_over_datum() {
        let wkt = r#"PROJCS["WGS 84 / UTM zone 48S",GEOGCS["WGS 84",DATUM["WGS_1984",SPHEROID["WGS 84",6378137,298.257223563,AUTHORITY["EPSG","7030"]],AUTHORITY["EPSG","6326"]],AUTHORITY["EPSG","4326"]],PROJECTION["Transverse_Mercator"],UNIT["metre",1,AUTHORITY["EPSG","9001"]],AUTHORITY["EPSG","32748"]]"#;
        let crs = Crs::from_wkt(wkt);
        assert_eq!(crs.epsg, Some(32748));
        assert_eq!(crs.definition, "EPSG:32748");
    }

    #[test]
    fn test_wkt2_id() {
        let wkt = r#"GEOGCRS["WGS 84",DATUM["World Geodetic System 1984"],ID["EPSG",4326]]"#;
        assert_eq!(Crs::from_wkt(wkt).epsg, Some(4326));
    }

    #[test]
    fn test_esri_wgs84_without_authority() {
        let wkt = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;
        assert!(Crs::from_wkt(wkt).is_wgs84());
    }

    #[test]
    fn test_unknown_wkt_kept_verbatim() {
        let wkt = r#"PROJCS["Local_Grid",GEOGCS["GCS_Local",DATUM["D_Local",SPHEROID["S",6378137.0,298.25]]],PROJECTION["Mercator"]]"#;
        let crs = Crs::from_wkt(wkt);
        assert_eq!(crs.epsg, None);
        assert_eq!(crs.definition, wkt);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(Crs::parse("EPSG:3857").unwrap().epsg, Some(3857));
        assert_eq!(Crs::parse("urn:ogc:def:crs:EPSG::32748").unwrap().epsg, Some(32748));
        assert_eq!(Crs::parse("urn:ogc:def:crs:OGC:1.3:CRS84").unwrap().epsg, Some(4326));
        assert_eq!(Crs::parse("4326").unwrap().epsg, Some(4326));
        assert!(Crs::parse("urn:ogc:def:crs:OGC:1.3:WHATEVER").is_err());
    }

    #[test]
    fn test_same_as() {
        let a = Crs::from_epsg(4326);
        let b = Crs::from_wkt(r#"GEOGCS["WGS 84",AUTHORITY["EPSG","4326"]]"#);
        assert!(a.same_as(&b));
        assert!(!a.same_as(&Crs::from_epsg(3857)));
    }

    #[test]
    fn test_bounding_box_from_flipped_corners() {
        let bbox = BoundingBox::from_corners((10.0, -5.0), (2.0, 7.0));
        assert_eq!(bbox.north, 7.0);
        assert_eq!(bbox.south, -5.0);
        assert_eq!(bbox.east, 10.0);
        assert_eq!(bbox.west, 2.0);
        assert_eq!(bbox.width(), 8.0);
        assert_eq!(bbox.height(), 12.0);
    }
}
