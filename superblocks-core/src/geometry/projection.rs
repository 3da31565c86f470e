//! Local metric projection (UTM on the WGS84 ellipsoid)

use geo::{Coord, MapCoords, Rect};
use serde::{Deserialize, Serialize};

/// Coordinate reference frame of a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Crs {
    /// Longitude/latitude in degrees (EPSG:4326)
    #[default]
    Wgs84,
    /// Planar coordinates already in metres
    Metric,
}

// WGS84 ellipsoid
const SEMI_MAJOR_AXIS: f64 = 6_378_137.0;
const FLATTENING: f64 = 1.0 / 298.257_223_563;
const SCALE_FACTOR: f64 = 0.9996;
const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Projection used for every operation measured in metres
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricProjection {
    /// Input is already metric
    Identity,
    /// Transverse Mercator for the given UTM zone
    Utm { zone: u8, south: bool },
}

impl MetricProjection {
    /// Pick the projection for data in `crs` covering `bounds`.
    ///
    /// Geographic data gets the UTM zone of the bounding box centre. Without
    /// bounds there is nothing to project and the identity is returned.
    pub fn estimate(crs: Crs, bounds: Option<Rect<f64>>) -> Self {
        match (crs, bounds) {
            (Crs::Metric, _) | (Crs::Wgs84, None) => MetricProjection::Identity,
            (Crs::Wgs84, Some(bounds)) => {
                let centre = bounds.center();
                Self::utm_for(centre.x, centre.y)
            }
        }
    }

    /// UTM zone containing the given longitude/latitude
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn utm_for(lon: f64, lat: f64) -> Self {
        let zone = (((lon + 180.0) / 6.0).floor() as i64 + 1).clamp(1, 60) as u8;
        MetricProjection::Utm {
            zone,
            south: lat < 0.0,
        }
    }

    pub fn is_identity(&self) -> bool {
        matches!(self, MetricProjection::Identity)
    }

    /// Project a geometry into the metric frame
    pub fn project<G>(&self, geometry: &G) -> G
    where
        G: MapCoords<f64, f64, Output = G>,
    {
        let projection = *self;
        geometry.map_coords(move |c| projection.forward(c))
    }

    /// Bring a metric geometry back into the source frame
    pub fn unproject<G>(&self, geometry: &G) -> G
    where
        G: MapCoords<f64, f64, Output = G>,
    {
        let projection = *self;
        geometry.map_coords(move |c| projection.inverse(c))
    }

    /// Longitude/latitude (degrees) to easting/northing (metres)
    pub fn forward(&self, coord: Coord<f64>) -> Coord<f64> {
        match *self {
            MetricProjection::Identity => coord,
            MetricProjection::Utm { zone, south } => {
                transverse_mercator_forward(coord, central_meridian(zone), south)
            }
        }
    }

    /// Easting/northing (metres) to longitude/latitude (degrees)
    pub fn inverse(&self, coord: Coord<f64>) -> Coord<f64> {
        match *self {
            MetricProjection::Identity => coord,
            MetricProjection::Utm { zone, south } => {
                transverse_mercator_inverse(coord, central_meridian(zone), south)
            }
        }
    }
}

/// Smallest rectangle covering all given rectangles
pub fn combined_bounds(rects: impl IntoIterator<Item = Rect<f64>>) -> Option<Rect<f64>> {
    rects.into_iter().reduce(|acc, rect| {
        Rect::new(
            Coord {
                x: acc.min().x.min(rect.min().x),
                y: acc.min().y.min(rect.min().y),
            },
            Coord {
                x: acc.max().x.max(rect.max().x),
                y: acc.max().y.max(rect.max().y),
            },
        )
    })
}

fn central_meridian(zone: u8) -> f64 {
    (f64::from(zone) - 1.0).mul_add(6.0, -180.0) + 3.0
}

fn eccentricity_squared() -> f64 {
    FLATTENING * (2.0 - FLATTENING)
}

fn meridian_arc(phi: f64) -> f64 {
    let e2 = eccentricity_squared();
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    SEMI_MAJOR_AXIS
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}

fn transverse_mercator_forward(coord: Coord<f64>, lon0: f64, south: bool) -> Coord<f64> {
    let e2 = eccentricity_squared();
    let ep2 = e2 / (1.0 - e2);

    let phi = coord.y.to_radians();
    let (sin_phi, cos_phi) = phi.sin_cos();
    let tan_phi = phi.tan();

    let n = SEMI_MAJOR_AXIS / (1.0 - e2 * sin_phi * sin_phi).sqrt();
    let t = tan_phi * tan_phi;
    let c = ep2 * cos_phi * cos_phi;
    let a = cos_phi * (coord.x - lon0).to_radians();
    let m = meridian_arc(phi);

    let a2 = a * a;
    let a3 = a2 * a;
    let a4 = a3 * a;
    let a5 = a4 * a;
    let a6 = a5 * a;

    let x = SCALE_FACTOR
        * n
        * (a + (1.0 - t + c) * a3 / 6.0
            + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a5 / 120.0)
        + FALSE_EASTING;

    let mut y = SCALE_FACTOR
        * (m + n
            * tan_phi
            * (a2 / 2.0
                + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a6 / 720.0));
    if south {
        y += FALSE_NORTHING_SOUTH;
    }

    Coord { x, y }
}

fn transverse_mercator_inverse(coord: Coord<f64>, lon0: f64, south: bool) -> Coord<f64> {
    let e2 = eccentricity_squared();
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    let ep2 = e2 / (1.0 - e2);

    let northing = if south {
        coord.y - FALSE_NORTHING_SOUTH
    } else {
        coord.y
    };

    let m = northing / SCALE_FACTOR;
    let mu = m / (SEMI_MAJOR_AXIS * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));

    let sqrt_one_minus_e2 = (1.0 - e2).sqrt();
    let e1 = (1.0 - sqrt_one_minus_e2) / (1.0 + sqrt_one_minus_e2);
    let e1_2 = e1 * e1;
    let e1_3 = e1_2 * e1;
    let e1_4 = e1_3 * e1;

    let phi1 = mu
        + (3.0 * e1 / 2.0 - 27.0 * e1_3 / 32.0) * (2.0 * mu).sin()
        + (21.0 * e1_2 / 16.0 - 55.0 * e1_4 / 32.0) * (4.0 * mu).sin()
        + (151.0 * e1_3 / 96.0) * (6.0 * mu).sin()
        + (1097.0 * e1_4 / 512.0) * (8.0 * mu).sin();

    let (sin_phi1, cos_phi1) = phi1.sin_cos();
    let tan_phi1 = phi1.tan();
    let c1 = ep2 * cos_phi1 * cos_phi1;
    let t1 = tan_phi1 * tan_phi1;
    let denom = 1.0 - e2 * sin_phi1 * sin_phi1;
    let n1 = SEMI_MAJOR_AXIS / denom.sqrt();
    let r1 = SEMI_MAJOR_AXIS * (1.0 - e2) / denom.powf(1.5);
    let d = (coord.x - FALSE_EASTING) / (n1 * SCALE_FACTOR);

    let d2 = d * d;
    let d3 = d2 * d;
    let d4 = d3 * d;
    let d5 = d4 * d;
    let d6 = d5 * d;

    let phi = phi1
        - (n1 * tan_phi1 / r1)
            * (d2 / 2.0
                - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d4 / 24.0
                + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                    * d6
                    / 720.0);

    let lambda = (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
        + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1) * d5 / 120.0)
        / cos_phi1;

    Coord {
        x: lon0 + lambda.to_degrees(),
        y: phi.to_degrees(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use geo::{Distance, Euclidean, Point, coord};

    #[test]
    fn picks_zone_from_centre() {
        // Budapest
        assert_eq!(
            MetricProjection::utm_for(19.04, 47.5),
            MetricProjection::Utm {
                zone: 34,
                south: false
            }
        );
        assert_eq!(
            MetricProjection::utm_for(-58.4, -34.6),
            MetricProjection::Utm {
                zone: 21,
                south: true
            }
        );
    }

    #[test]
    fn metric_frame_is_not_reprojected() {
        let bounds = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 10.0, y: 10.0 });
        let projection = MetricProjection::estimate(Crs::Metric, Some(bounds));
        assert!(projection.is_identity());
        let c = coord! { x: 3.0, y: 4.0 };
        assert_eq!(projection.forward(c), c);
    }

    #[test]
    fn round_trip_is_stable() {
        let projection = MetricProjection::utm_for(19.04, 47.5);
        let original = coord! { x: 19.0402, y: 47.4979 };
        let back = projection.inverse(projection.forward(original));
        assert_abs_diff_eq!(back.x, original.x, epsilon = 1e-7);
        assert_abs_diff_eq!(back.y, original.y, epsilon = 1e-7);
    }

    #[test]
    fn one_millidegree_of_latitude_is_about_111_metres() {
        let projection = MetricProjection::utm_for(19.04, 47.5);
        let a = Point::from(projection.forward(coord! { x: 19.04, y: 47.5 }));
        let b = Point::from(projection.forward(coord! { x: 19.04, y: 47.501 }));
        let distance = Euclidean.distance(&a, &b);
        assert!((distance - 111.2).abs() < 0.5, "got {distance}");
    }

    #[test]
    fn combines_bounds() {
        let a = Rect::new(coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 1.0 });
        let b = Rect::new(coord! { x: -1.0, y: 0.5 }, coord! { x: 0.5, y: 3.0 });
        let merged = combined_bounds([a, b]).unwrap();
        assert_eq!(merged.min(), coord! { x: -1.0, y: 0.0 });
        assert_eq!(merged.max(), coord! { x: 1.0, y: 3.0 });
        assert!(combined_bounds(Vec::new()).is_none());
    }
}
