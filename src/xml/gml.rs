//! GML geometries and time objects.
//!
//! Geometries are read from GML 2 or GML 3.2 markup, put in x,y order, and
//! written as WKT. Time objects are read into [`TemporalObject`] and written
//! back as GML 3.2.

use geo_types::{Coord, LineString, Point, Polygon, Rect};
use geozero::ToWkt;
use roxmltree::Node;
use tracing::debug;

use super::{XmlElement, child_elements, clark_name, is_gml};
use crate::error::{FesError, Result};
use crate::model::{Geometry, TemporalObject};

/// Reference system assumed when a geometry carries no `srsName`.
pub const DEFAULT_SRS_NAME: &str = "http://www.opengis.net/def/crs/EPSG/0/4326";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOrder {
    /// easting, northing (WKT order)
    XY,
    /// northing, easting
    YX,
}

// Reference systems whose GML coordinates are already in x,y order.
const XY_SRS_NAMES: &[&str] = &[
    "EPSG:4326",
    "CRS:84",
    "urn:ogc:def:crs:OGC:1.3:CRS84",
    "urn:ogc:def:crs:OGC::CRS84",
    "http://www.opengis.net/def/crs/OGC/1.3/CRS84",
    "http://www.opengis.net/gml/srs/epsg.xml#4326",
];

/// Axis order of coordinates written in `srs_name`. Anything not known to be
/// x,y is read as lat,lon.
pub fn axis_order(srs_name: &str) -> AxisOrder {
    if XY_SRS_NAMES.contains(&srs_name) {
        AxisOrder::XY
    } else {
        AxisOrder::YX
    }
}

fn gml_child<'a, 'i>(node: Node<'a, 'i>, name: &'static str) -> Option<Node<'a, 'i>> {
    gml_children(node, name).next()
}

fn gml_children<'a, 'i>(
    node: Node<'a, 'i>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'i>> {
    child_elements(node)
        .filter(move |child| is_gml(child.tag_name().namespace()) && child.tag_name().name() == name)
}

fn numbers(node: Node<'_, '_>) -> Result<Vec<f64>> {
    node.text()
        .unwrap_or_default()
        .split_whitespace()
        .map(|n| {
            n.parse::<f64>()
                .map_err(|_| FesError::parse(format!("{n:?} in {} is not a number", clark_name(node))))
        })
        .collect()
}

fn dimension(node: Node<'_, '_>) -> Result<usize> {
    match node.attribute("srsDimension") {
        None => Ok(2),
        Some(dim) => match dim.parse::<usize>() {
            Ok(dim) if dim >= 2 => Ok(dim),
            _ => Err(FesError::parse(format!("invalid srsDimension {dim:?}"))),
        },
    }
}

fn pair(values: &[f64], node: Node<'_, '_>) -> Result<Coord<f64>> {
    match values {
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(FesError::parse(format!(
            "{} needs at least two ordinates",
            clark_name(node)
        ))),
    }
}

/// Coordinates of `node` as written, from `posList`, `pos`, `coordinates`,
/// `coord`, or `lowerCorner`/`upperCorner`.
fn positions(node: Node<'_, '_>) -> Result<Vec<Coord<f64>>> {
    if let Some(pos_list) = gml_child(node, "posList") {
        let dim = dimension(pos_list)?;
        let values = numbers(pos_list)?;
        if values.len() % dim != 0 {
            return Err(FesError::parse(format!(
                "posList has {} ordinates, not a multiple of {dim}",
                values.len()
            )));
        }
        return values.chunks(dim).map(|c| pair(c, pos_list)).collect();
    }

    let pos: Vec<Node> = gml_children(node, "pos").collect();
    if !pos.is_empty() {
        return pos.into_iter().map(|p| pair(&numbers(p)?, p)).collect();
    }

    if let Some(coordinates) = gml_child(node, "coordinates") {
        let text = coordinates.text().unwrap_or_default();
        return text
            .split_whitespace()
            .map(|tuple| {
                let values = tuple
                    .split(',')
                    .map(|n| {
                        n.parse::<f64>()
                            .map_err(|_| FesError::parse(format!("{n:?} is not a number")))
                    })
                    .collect::<Result<Vec<f64>>>()?;
                pair(&values, coordinates)
            })
            .collect();
    }

    let coords: Vec<Node> = gml_children(node, "coord").collect();
    if !coords.is_empty() {
        return coords
            .into_iter()
            .map(|coord| {
                let x = gml_child(coord, "X").map(numbers).transpose()?;
                let y = gml_child(coord, "Y").map(numbers).transpose()?;
                match (x.as_deref(), y.as_deref()) {
                    (Some([x]), Some([y])) => Ok(Coord { x: *x, y: *y }),
                    _ => Err(FesError::parse("gml:coord needs one X and one Y")),
                }
            })
            .collect();
    }

    if let (Some(lower), Some(upper)) = (gml_child(node, "lowerCorner"), gml_child(node, "upperCorner")) {
        return Ok(vec![pair(&numbers(lower)?, lower)?, pair(&numbers(upper)?, upper)?]);
    }

    Err(FesError::parse(format!("no coordinates in {}", clark_name(node))))
}

fn ordered(mut coords: Vec<Coord<f64>>, order: AxisOrder) -> Vec<Coord<f64>> {
    if order == AxisOrder::YX {
        for coord in &mut coords {
            std::mem::swap(&mut coord.x, &mut coord.y);
        }
    }
    coords
}

fn ring(node: Node<'_, '_>, order: AxisOrder) -> Result<LineString<f64>> {
    let linear_ring = gml_child(node, "LinearRing")
        .ok_or_else(|| FesError::parse(format!("{} has no gml:LinearRing", clark_name(node))))?;
    let coords = ordered(positions(linear_ring)?, order);
    if coords.len() < 3 {
        return Err(FesError::parse("a linear ring needs at least three positions"));
    }
    Ok(LineString::new(coords))
}

fn polygon(node: Node<'_, '_>, order: AxisOrder) -> Result<Polygon<f64>> {
    let exterior = gml_child(node, "exterior")
        .or_else(|| gml_child(node, "outerBoundaryIs"))
        .ok_or_else(|| FesError::parse("gml:Polygon has no exterior ring"))?;
    let interiors = gml_children(node, "interior")
        .chain(gml_children(node, "innerBoundaryIs"))
        .map(|interior| ring(interior, order))
        .collect::<Result<Vec<_>>>()?;
    Ok(Polygon::new(ring(exterior, order)?, interiors))
}

fn envelope(node: Node<'_, '_>, order: AxisOrder) -> Result<Polygon<f64>> {
    match ordered(positions(node)?, order).as_slice() {
        [lower, upper] => Ok(Rect::new(*lower, *upper).to_polygon()),
        _ => Err(FesError::parse(format!(
            "{} needs exactly two corners",
            clark_name(node)
        ))),
    }
}

/// Convert a GML geometry element to a WKT [`Geometry`].
pub fn parse_geometry(node: Node<'_, '_>) -> Result<Geometry> {
    if !is_gml(node.tag_name().namespace()) {
        return Err(FesError::parse(format!(
            "{} is not a GML element",
            clark_name(node)
        )));
    }
    let srs_name = node.attribute("srsName");
    let order = axis_order(srs_name.unwrap_or(DEFAULT_SRS_NAME));

    let geometry: geo_types::Geometry<f64> = match node.tag_name().name() {
        "Point" => match ordered(positions(node)?, order).as_slice() {
            [coord] => Point::from(*coord).into(),
            _ => return Err(FesError::parse("gml:Point needs exactly one position")),
        },
        "LineString" => {
            let coords = ordered(positions(node)?, order);
            if coords.len() < 2 {
                return Err(FesError::parse("gml:LineString needs at least two positions"));
            }
            LineString::new(coords).into()
        }
        "Polygon" => polygon(node, order)?.into(),
        "Box" | "Envelope" => envelope(node, order)?.into(),
        _ => {
            return Err(FesError::parse(format!(
                "invalid GML geometry element {}",
                clark_name(node)
            )));
        }
    };

    let wkt = geometry
        .to_wkt()
        .map_err(|e| FesError::parse(format!("cannot write WKT: {e}")))?;
    debug!(element = %clark_name(node), %wkt, "converted GML geometry");

    let geometry = Geometry::from_wkt(wkt)?;
    Ok(match srs_name {
        Some(srs_name) => geometry.with_srs_name(srs_name),
        None => geometry,
    })
}

fn gml_id(node: Node<'_, '_>) -> Option<String> {
    node.attributes()
        .find(|attr| attr.name() == "id" && is_gml(attr.namespace()))
        .map(|attr| attr.value().to_string())
}

fn text_of(node: Node<'_, '_>) -> String {
    node.text().unwrap_or_default().trim().to_string()
}

/// A period end given either as `beginPosition` or as `begin/TimeInstant`.
fn period_end(node: Node<'_, '_>, position: &'static str, wrapper: &'static str) -> Result<String> {
    if let Some(position) = gml_child(node, position) {
        return Ok(text_of(position));
    }
    gml_child(node, wrapper)
        .and_then(|wrapper| gml_child(wrapper, "TimeInstant"))
        .and_then(|instant| gml_child(instant, "timePosition"))
        .map(text_of)
        .ok_or_else(|| FesError::parse(format!("gml:TimePeriod has no {wrapper}")))
}

/// Read a `gml:TimeInstant` or `gml:TimePeriod`.
pub fn parse_temporal(node: Node<'_, '_>) -> Result<TemporalObject> {
    if !is_gml(node.tag_name().namespace()) {
        return Err(FesError::parse(format!(
            "{} is not a GML element",
            clark_name(node)
        )));
    }
    let object = match node.tag_name().name() {
        "TimeInstant" => {
            let position = gml_child(node, "timePosition")
                .ok_or_else(|| FesError::parse("gml:TimeInstant has no timePosition"))?;
            TemporalObject::instant(text_of(position))?
        }
        "TimePeriod" => TemporalObject::period(
            period_end(node, "beginPosition", "begin")?,
            period_end(node, "endPosition", "end")?,
        )?,
        _ => {
            return Err(FesError::parse(format!(
                "invalid GML time element {}",
                clark_name(node)
            )));
        }
    };
    Ok(match gml_id(node) {
        Some(id) => object.with_id(id),
        None => object,
    })
}

/// GML 3.2 encoding of a time object.
pub fn temporal_element(object: &TemporalObject) -> XmlElement {
    let (element, id) = match object {
        TemporalObject::Instant { id, position } => (
            XmlElement::gml("TimeInstant")
                .with_child(XmlElement::gml("timePosition").with_text(position.clone())),
            id,
        ),
        TemporalObject::Period { id, begin, end } => (
            XmlElement::gml("TimePeriod")
                .with_child(XmlElement::gml("beginPosition").with_text(begin.clone()))
                .with_child(XmlElement::gml("endPosition").with_text(end.clone())),
            id,
        ),
    };
    match id {
        Some(id) => XmlElement {
            attributes: vec![("gml:id".to_string(), id.clone())],
            ..element
        },
        None => element,
    }
}
