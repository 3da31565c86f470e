//! Face extraction from an arrangement of line work
//!
//! All input lines are noded against each other (split at every crossing and
//! overlap endpoint), merged into one planar graph, stripped of dangles and
//! cut edges, and every bounded face of the graph is returned as a polygon.
//! Components nested inside a face become holes of that face.

use geo::algorithm::line_intersection::{LineIntersection, line_intersection};
use geo::{Area, Contains, Coord, Line, LineString, Point, Polygon};
use hashbrown::{HashMap, HashSet};
use itertools::Itertools;
use log::{debug, trace};
use petgraph::stable_graph::{NodeIndex, StableUnGraph};
use rstar::{
    AABB, PointDistance, RTree,
    primitives::{GeomWithData, Rectangle},
};

/// Vertices closer than this (native units) are the same node
const SNAP_TOLERANCE: f64 = 1e-9;

/// Faces below this (absolute, native units) are noding slivers
const MIN_RING_AREA: f64 = 1e-18;

type PlanarGraph = StableUnGraph<Coord<f64>, ()>;
type IndexedLine = GeomWithData<Rectangle<[f64; 2]>, usize>;
type IndexedNode = GeomWithData<[f64; 2], NodeIndex>;

/// Extract the minimal enclosed polygons formed by `lines`
pub fn polygonize<'a, I>(lines: I) -> Vec<Polygon<f64>>
where
    I: IntoIterator<Item = &'a LineString<f64>>,
{
    let segments: Vec<Line<f64>> = lines
        .into_iter()
        .flat_map(LineString::lines)
        .filter(|line| line.start != line.end)
        .collect();

    if segments.is_empty() {
        return Vec::new();
    }

    let pieces = node_segments(&segments);
    let mut graph = build_graph(&pieces);
    prune_dangles(&mut graph);

    let rings = loop {
        let rings = trace_rings(&graph);
        let cut_edges = find_cut_edges(&rings);
        if cut_edges.is_empty() {
            break rings;
        }
        trace!("Removing {} cut edges", cut_edges.len());
        for (a, b) in cut_edges {
            if let Some(edge) = graph.find_edge(a, b) {
                graph.remove_edge(edge);
            }
        }
        prune_dangles(&mut graph);
    };

    let polygons = assemble_polygons(&graph, &rings);
    debug!(
        "Polygonized {} segments into {} faces",
        segments.len(),
        polygons.len()
    );
    polygons
}

fn coincident(a: &Coord<f64>, b: &Coord<f64>) -> bool {
    (a.x - b.x).hypot(a.y - b.y) <= SNAP_TOLERANCE
}

/// Graph nodes indexed by position, merging vertices within the tolerance
#[derive(Default)]
struct NodeSnapper {
    tree: RTree<IndexedNode>,
}

impl NodeSnapper {
    fn node_for(&mut self, graph: &mut PlanarGraph, coord: Coord<f64>) -> NodeIndex {
        let point = [coord.x, coord.y];
        if let Some(existing) = self.tree.nearest_neighbor(&point)
            && existing.distance_2(&point) <= SNAP_TOLERANCE * SNAP_TOLERANCE
        {
            return existing.data;
        }
        let node = graph.add_node(coord);
        self.tree.insert(GeomWithData::new(point, node));
        node
    }
}

fn envelope(line: &Line<f64>) -> Rectangle<[f64; 2]> {
    Rectangle::from_corners([line.start.x, line.start.y], [line.end.x, line.end.y])
}

/// Split every segment at each point where it meets another segment
fn node_segments(segments: &[Line<f64>]) -> Vec<Line<f64>> {
    let tree: RTree<IndexedLine> = RTree::bulk_load(
        segments
            .iter()
            .enumerate()
            .map(|(idx, line)| GeomWithData::new(envelope(line), idx))
            .collect(),
    );

    let mut cuts: Vec<Vec<Coord<f64>>> = segments
        .iter()
        .map(|line| vec![line.start, line.end])
        .collect();

    for (idx, line) in segments.iter().enumerate() {
        let search = AABB::from_corners([line.start.x, line.start.y], [line.end.x, line.end.y]);
        for candidate in tree.locate_in_envelope_intersecting(&search) {
            let other = candidate.data;
            if other <= idx {
                continue;
            }
            match line_intersection(*line, segments[other]) {
                Some(LineIntersection::SinglePoint { intersection, .. }) => {
                    cuts[idx].push(intersection);
                    cuts[other].push(intersection);
                }
                Some(LineIntersection::Collinear { intersection }) => {
                    for point in [intersection.start, intersection.end] {
                        cuts[idx].push(point);
                        cuts[other].push(point);
                    }
                }
                None => {}
            }
        }
    }

    segments
        .iter()
        .zip(cuts)
        .flat_map(|(line, points)| split_at(line, points))
        .collect()
}

fn split_at(line: &Line<f64>, points: Vec<Coord<f64>>) -> Vec<Line<f64>> {
    let delta = line.delta();
    let length_squared = delta.x * delta.x + delta.y * delta.y;
    let position = |c: &Coord<f64>| {
        ((c.x - line.start.x) * delta.x + (c.y - line.start.y) * delta.y) / length_squared
    };

    points
        .into_iter()
        .sorted_by(|a, b| position(a).total_cmp(&position(b)))
        .dedup_by(coincident)
        .tuple_windows()
        .map(|(start, end)| Line::new(start, end))
        .collect()
}

fn build_graph(pieces: &[Line<f64>]) -> PlanarGraph {
    let mut graph = PlanarGraph::default();
    let mut nodes = NodeSnapper::default();
    let mut edges: HashSet<(NodeIndex, NodeIndex)> = HashSet::new();

    for piece in pieces {
        let a = nodes.node_for(&mut graph, piece.start);
        let b = nodes.node_for(&mut graph, piece.end);
        if a == b {
            continue;
        }
        if edges.insert((a.min(b), a.max(b))) {
            graph.add_edge(a, b, ());
        }
    }

    graph
}

/// Repeatedly remove nodes of degree zero or one
fn prune_dangles(graph: &mut PlanarGraph) {
    let mut stack: Vec<NodeIndex> = graph
        .node_indices()
        .filter(|&node| graph.neighbors(node).count() <= 1)
        .collect();

    while let Some(node) = stack.pop() {
        if !graph.contains_node(node) || graph.neighbors(node).count() > 1 {
            continue;
        }
        let neighbors: Vec<NodeIndex> = graph.neighbors(node).collect();
        graph.remove_node(node);
        stack.extend(
            neighbors
                .into_iter()
                .filter(|&neighbor| graph.neighbors(neighbor).count() <= 1),
        );
    }
}

/// Neighbours of every node sorted counter-clockwise by angle
fn angular_order(graph: &PlanarGraph) -> HashMap<NodeIndex, Vec<NodeIndex>> {
    graph
        .node_indices()
        .map(|node| {
            let origin = graph[node];
            let around = graph
                .neighbors(node)
                .map(|neighbor| {
                    let target = graph[neighbor];
                    (neighbor, (target.y - origin.y).atan2(target.x - origin.x))
                })
                .sorted_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
                .map(|(neighbor, _)| neighbor)
                .collect();
            (node, around)
        })
        .collect()
}

/// Walk every directed edge once, keeping the face on the left.
///
/// Bounded faces come out counter-clockwise; the outer boundary of each
/// connected component comes out clockwise.
fn trace_rings(graph: &PlanarGraph) -> Vec<Vec<NodeIndex>> {
    let order = angular_order(graph);
    let mut visited: HashSet<(NodeIndex, NodeIndex)> = HashSet::new();
    let mut rings = Vec::new();
    let max_steps = 2 * graph.edge_count() + 1;

    for start in graph.node_indices() {
        let Some(around) = order.get(&start) else {
            continue;
        };
        for &first in around {
            if visited.contains(&(start, first)) {
                continue;
            }
            if let Some(ring) = trace_ring(&order, &mut visited, (start, first), max_steps) {
                rings.push(ring);
            }
        }
    }

    rings
}

fn trace_ring(
    order: &HashMap<NodeIndex, Vec<NodeIndex>>,
    visited: &mut HashSet<(NodeIndex, NodeIndex)>,
    first: (NodeIndex, NodeIndex),
    max_steps: usize,
) -> Option<Vec<NodeIndex>> {
    let mut ring = Vec::new();
    let (mut from, mut to) = first;

    for _ in 0..max_steps {
        visited.insert((from, to));
        ring.push(from);

        // Turn as far left as possible: the neighbour just clockwise of `from`
        let around = order.get(&to)?;
        let back = around.iter().position(|&n| n == from)?;
        let next = around[(back + around.len() - 1) % around.len()];

        from = to;
        to = next;
        if (from, to) == first {
            return Some(ring);
        }
    }

    None
}

/// Edges walked in both directions by the same ring border the same face
fn find_cut_edges(rings: &[Vec<NodeIndex>]) -> Vec<(NodeIndex, NodeIndex)> {
    let mut cut = Vec::new();
    for ring in rings {
        let directed: HashSet<(NodeIndex, NodeIndex)> =
            ring.iter().copied().circular_tuple_windows().collect();
        for &(a, b) in &directed {
            if a < b && directed.contains(&(b, a)) {
                cut.push((a, b));
            }
        }
    }
    cut.sort_unstable();
    cut.dedup();
    cut
}

fn ring_coords(graph: &PlanarGraph, ring: &[NodeIndex]) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = ring.iter().map(|&node| graph[node]).collect();
    if let Some(&first) = coords.first() {
        coords.push(first);
    }
    LineString::new(coords)
}

fn signed_ring_area(ring: &LineString<f64>) -> f64 {
    ring.lines()
        .map(|line| line.start.x * line.end.y - line.end.x * line.start.y)
        .sum::<f64>()
        / 2.0
}

fn assemble_polygons(graph: &PlanarGraph, rings: &[Vec<NodeIndex>]) -> Vec<Polygon<f64>> {
    let mut shells: Vec<(Polygon<f64>, f64)> = Vec::new();
    let mut outer_boundaries: Vec<LineString<f64>> = Vec::new();

    for ring in rings {
        let coords = ring_coords(graph, ring);
        let area = signed_ring_area(&coords);
        if area > MIN_RING_AREA {
            let shell = Polygon::new(coords, vec![]);
            let size = shell.unsigned_area();
            shells.push((shell, size));
        } else if area < -MIN_RING_AREA {
            outer_boundaries.push(coords);
        }
    }

    // A component's outer boundary touches its own faces, so strict
    // containment only finds faces of enclosing components.
    let mut holes: Vec<Vec<LineString<f64>>> = vec![Vec::new(); shells.len()];
    for boundary in outer_boundaries {
        let Some(&probe) = boundary.0.first() else {
            continue;
        };
        let probe = Point::from(probe);
        let enclosing = shells
            .iter()
            .enumerate()
            .filter(|(_, (shell, _))| shell.contains(&probe))
            .min_by(|a, b| a.1.1.total_cmp(&b.1.1))
            .map(|(idx, _)| idx);
        if let Some(idx) = enclosing {
            holes[idx].push(boundary);
        }
    }

    shells
        .into_iter()
        .zip(holes)
        .map(|((shell, _), interiors)| {
            let (exterior, _) = shell.into_inner();
            Polygon::new(exterior, interiors)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use geo::line_string;

    fn square_ring(x0: f64, y0: f64, size: f64) -> Vec<LineString<f64>> {
        vec![
            line_string![(x: x0, y: y0), (x: x0 + size, y: y0)],
            line_string![(x: x0 + size, y: y0), (x: x0 + size, y: y0 + size)],
            line_string![(x: x0 + size, y: y0 + size), (x: x0, y: y0 + size)],
            line_string![(x: x0, y: y0 + size), (x: x0, y: y0)],
        ]
    }

    #[test]
    fn single_square_gives_one_face() {
        let faces = polygonize(&square_ring(0.0, 0.0, 2.0));
        assert_eq!(faces.len(), 1);
        assert_abs_diff_eq!(faces[0].unsigned_area(), 4.0, epsilon = 1e-9);
        assert!(faces[0].interiors().is_empty());
    }

    #[test]
    fn crossing_streets_are_noded_into_grid_cells() {
        let mut lines = square_ring(0.0, 0.0, 2.0);
        // Cross streets that only meet the ring mid-segment
        lines.push(line_string![(x: 0.0, y: 1.0), (x: 2.0, y: 1.0)]);
        lines.push(line_string![(x: 1.0, y: 0.0), (x: 1.0, y: 2.0)]);

        let faces = polygonize(&lines);
        assert_eq!(faces.len(), 4);
        for face in &faces {
            assert_abs_diff_eq!(face.unsigned_area(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn dangles_and_open_lines_are_ignored() {
        let mut lines = square_ring(0.0, 0.0, 2.0);
        lines.push(line_string![(x: 1.0, y: 1.0), (x: 1.5, y: 1.5)]);
        lines.push(line_string![(x: 2.0, y: 2.0), (x: 3.0, y: 3.0)]);
        lines.push(line_string![(x: 10.0, y: 10.0), (x: 11.0, y: 10.0)]);

        let faces = polygonize(&lines);
        assert_eq!(faces.len(), 1);
        assert_abs_diff_eq!(faces[0].unsigned_area(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn bridge_between_two_loops_is_not_a_face() {
        let mut lines = square_ring(0.0, 0.0, 1.0);
        lines.extend(square_ring(3.0, 0.0, 1.0));
        lines.push(line_string![(x: 1.0, y: 0.5), (x: 3.0, y: 0.5)]);

        let faces = polygonize(&lines);
        assert_eq!(faces.len(), 2);
        for face in &faces {
            assert_abs_diff_eq!(face.unsigned_area(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn nested_loop_becomes_a_hole() {
        let mut lines = square_ring(0.0, 0.0, 10.0);
        lines.extend(square_ring(4.0, 4.0, 2.0));

        let faces = polygonize(&lines);
        assert_eq!(faces.len(), 2);
        let outer = faces
            .iter()
            .find(|face| !face.interiors().is_empty())
            .unwrap();
        assert_abs_diff_eq!(outer.unsigned_area(), 96.0, epsilon = 1e-9);
    }

    #[test]
    fn duplicated_and_overlapping_lines_do_not_duplicate_faces() {
        let mut lines = square_ring(0.0, 0.0, 2.0);
        lines.push(line_string![(x: 0.5, y: 0.0), (x: 1.5, y: 0.0)]);
        lines.extend(square_ring(0.0, 0.0, 2.0));

        assert_eq!(polygonize(&lines).len(), 1);
    }

    #[test]
    fn nearly_equal_vertices_close_the_face() {
        // Corner coordinates straddle a multiple of the snapping tolerance
        let below = 1.0 + 0.49e-9;
        let above = 1.0 + 0.51e-9;
        let lines = vec![
            line_string![(x: 0.0, y: 0.0), (x: below, y: 0.0)],
            line_string![(x: above, y: 0.0), (x: 1.0, y: 1.0)],
            line_string![(x: 1.0, y: 1.0), (x: 0.0, y: 1.0)],
            line_string![(x: 0.0, y: 1.0), (x: 0.0, y: 0.0)],
        ];

        let faces = polygonize(&lines);
        assert_eq!(faces.len(), 1);
        assert_abs_diff_eq!(faces[0].unsigned_area(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn empty_input_gives_no_faces() {
        let lines: Vec<LineString<f64>> = Vec::new();
        assert!(polygonize(&lines).is_empty());
    }
}
