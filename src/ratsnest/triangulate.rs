//! Delaunay triangulation of a net's node positions
//!
//! Only the edge set matters here: it is a sparse superset of the Euclidean
//! minimum spanning tree. Points are inserted one by one (Bowyer-Watson): the
//! triangles whose circumcircle contains the new point are carved out and the
//! cavity is re-fanned around it.
//!
//! Hull edges are closed by ghost triangles sharing one symbolic vertex at
//! infinity, so no finite enclosing triangle can distort the hull. Orientation
//! is exact in `i128` and the in-circle test uses adaptive exact arithmetic.

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::unionfind::UnionFind;
use robust::{incircle, Coord};

use crate::board::Point;

type Vertex = [i64; 2];

/// Vertex at infinity; ghost triangles store it last
const GHOST: usize = usize::MAX;

/// Undirected edges `(i, j)`, `i < j`, over indices into `points`
///
/// Points must be distinct. The result is sorted and always connects every
/// point, even for degenerate (collinear) input.
pub fn delaunay_edges(points: &[Point]) -> Vec<(usize, usize)> {
    let n = points.len();
    if n < 2 {
        return Vec::new();
    }
    if n == 2 {
        return vec![(0, 1)];
    }

    let mut edges: BTreeSet<(usize, usize)> = BTreeSet::new();

    // All collinear: no triangles, the chain below is the whole answer
    if let Some((mut mesh, seed)) = Mesh::seed(points) {
        for p in (0..n).filter(|p| !seed.contains(p)) {
            mesh.insert(p);
        }
        for tri in mesh.tris.iter().flatten().filter(|t| t[2] != GHOST) {
            for k in 0..3 {
                let (a, b) = (tri[k], tri[(k + 1) % 3]);
                edges.insert((a.min(b), a.max(b)));
            }
        }
    }

    complete_spanning(points, &mut edges);
    edges.into_iter().collect()
}

/// Chain disconnected parts together along position order
fn complete_spanning(points: &[Point], edges: &mut BTreeSet<(usize, usize)>) {
    let mut sets = UnionFind::<usize>::new(points.len());
    for &(a, b) in edges.iter() {
        sets.union(a, b);
    }

    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by_key(|&i| points[i]);

    for w in order.windows(2) {
        if sets.union(w[0], w[1]) {
            edges.insert((w[0].min(w[1]), w[0].max(w[1])));
        }
    }
}

/// Triangle mesh; real triangles are counter-clockwise
///
/// A ghost `[a, b, GHOST]` sits outside hull edge `(a, b)` and covers the
/// open half-plane left of `a -> b`.
struct Mesh {
    verts: Vec<Vertex>,
    tris: Vec<Option<[usize; 3]>>,
    /// Directed edge -> triangle owning it
    edge_owner: HashMap<(usize, usize), usize>,
    free: Vec<usize>,
    /// Last real triangle created, where point location starts
    last: usize,
}

impl Mesh {
    /// First non-degenerate triangle plus its three ghosts
    fn seed(points: &[Point]) -> Option<(Self, [usize; 3])> {
        let verts: Vec<Vertex> = points
            .iter()
            .map(|p| [i64::from(p.x), i64::from(p.y)])
            .collect();

        let (a, b) = (0, 1);
        let c = (2..verts.len()).find(|&c| orient(verts[a], verts[b], verts[c]) != 0)?;
        let (b, c) = if orient(verts[a], verts[b], verts[c]) > 0 {
            (b, c)
        } else {
            (c, b)
        };

        let mut mesh = Mesh {
            tris: Vec::with_capacity(4 * verts.len()),
            edge_owner: HashMap::with_capacity(12 * verts.len()),
            verts,
            free: Vec::new(),
            last: 0,
        };
        mesh.add_tri(a, b, c);
        mesh.add_tri(b, a, GHOST);
        mesh.add_tri(c, b, GHOST);
        mesh.add_tri(a, c, GHOST);
        Some((mesh, [a, b, c]))
    }

    fn add_tri(&mut self, a: usize, b: usize, c: usize) -> usize {
        // Rotate so the ghost vertex, if any, comes last
        let tri = if a == GHOST {
            [b, c, a]
        } else if b == GHOST {
            [c, a, b]
        } else {
            [a, b, c]
        };
        debug_assert!(
            tri[2] == GHOST || orient(self.verts[a], self.verts[b], self.verts[c]) > 0,
            "triangles must be counter-clockwise"
        );

        let t = match self.free.pop() {
            Some(t) => {
                self.tris[t] = Some(tri);
                t
            }
            None => {
                self.tris.push(Some(tri));
                self.tris.len() - 1
            }
        };
        for k in 0..3 {
            self.edge_owner.insert((tri[k], tri[(k + 1) % 3]), t);
        }
        if tri[2] != GHOST {
            self.last = t;
        }
        t
    }

    fn remove_tri(&mut self, t: usize) {
        if let Some(tri) = self.tris[t].take() {
            for k in 0..3 {
                let e = (tri[k], tri[(k + 1) % 3]);
                if self.edge_owner.get(&e) == Some(&t) {
                    self.edge_owner.remove(&e);
                }
            }
            self.free.push(t);
        }
    }

    /// `p` lies strictly inside the circumcircle of `tri`
    ///
    /// For a ghost the circle degenerates to the open outer half-plane plus
    /// the open hull edge itself.
    fn conflicts(&self, tri: [usize; 3], p: usize) -> bool {
        let pv = self.verts[p];
        let (av, bv) = (self.verts[tri[0]], self.verts[tri[1]]);
        if tri[2] != GHOST {
            return in_circle(av, bv, self.verts[tri[2]], pv);
        }
        match orient(av, bv, pv) {
            o if o > 0 => true,
            0 => strictly_between(av, bv, pv),
            _ => false,
        }
    }

    fn insert(&mut self, p: usize) {
        let Some(start) = self.locate(p) else {
            debug_assert!(false, "no triangle in conflict with point {}", p);
            return;
        };

        // Conflict region is connected: grow it across shared edges
        let mut cavity = vec![start];
        let mut in_cavity: HashSet<usize> = HashSet::from([start]);
        let mut boundary: Vec<(usize, usize)> = Vec::new();
        let mut i = 0;
        while i < cavity.len() {
            let t = cavity[i];
            i += 1;
            let Some(tri) = self.tris[t] else {
                continue;
            };
            for k in 0..3 {
                let (a, b) = (tri[k], tri[(k + 1) % 3]);
                match self.edge_owner.get(&(b, a)).copied() {
                    Some(n) if in_cavity.contains(&n) => {}
                    Some(n) if self.tris[n].is_some_and(|nt| self.conflicts(nt, p)) => {
                        in_cavity.insert(n);
                        cavity.push(n);
                    }
                    _ => boundary.push((a, b)),
                }
            }
        }

        for t in cavity {
            self.remove_tri(t);
        }
        for (a, b) in boundary {
            self.add_tri(a, b, p);
        }
    }

    /// Some triangle in conflict with `p`, found by walking from the last one
    fn locate(&self, p: usize) -> Option<usize> {
        let pv = self.verts[p];
        let mut t = self.last;
        let mut steps = self.tris.len() + 8;

        'walk: while steps > 0 {
            steps -= 1;
            let Some(tri) = self.tris.get(t).copied().flatten() else {
                break 'walk;
            };
            if tri[2] == GHOST {
                if self.conflicts(tri, p) {
                    return Some(t);
                }
                break 'walk;
            }
            for k in 0..3 {
                let (a, b) = (tri[k], tri[(k + 1) % 3]);
                if orient(self.verts[a], self.verts[b], pv) < 0 {
                    match self.edge_owner.get(&(b, a)) {
                        Some(&next) => {
                            t = next;
                            continue 'walk;
                        }
                        None => break 'walk,
                    }
                }
            }
            if self.conflicts(tri, p) {
                return Some(t);
            }
            break 'walk;
        }

        // Walk did not converge; scan
        self.tris
            .iter()
            .enumerate()
            .find_map(|(i, tri)| (*tri).filter(|&tri| self.conflicts(tri, p)).map(|_| i))
    }
}

/// Twice the signed area of (a, b, c); positive when counter-clockwise
fn orient(a: Vertex, b: Vertex, c: Vertex) -> i128 {
    let abx = i128::from(b[0] - a[0]);
    let aby = i128::from(b[1] - a[1]);
    let acx = i128::from(c[0] - a[0]);
    let acy = i128::from(c[1] - a[1]);
    abx * acy - aby * acx
}

/// `p` on segment `(a, b)`, excluding both ends; `p` must be collinear
fn strictly_between(a: Vertex, b: Vertex, p: Vertex) -> bool {
    let dot = |u: Vertex, v: Vertex, w: Vertex| {
        i128::from(v[0] - u[0]) * i128::from(w[0] - u[0])
            + i128::from(v[1] - u[1]) * i128::from(w[1] - u[1])
    };
    dot(a, b, p) > 0 && dot(b, a, p) > 0
}

/// `d` strictly inside the circumcircle of counter-clockwise (a, b, c)
///
/// Board coordinates are `i32`, so the `f64` conversion is exact.
fn in_circle(a: Vertex, b: Vertex, c: Vertex, d: Vertex) -> bool {
    let coord = |v: Vertex| Coord {
        x: v[0] as f64,
        y: v[1] as f64,
    };
    incircle(coord(a), coord(b), coord(c), coord(d)) > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(i32, i32)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    fn is_connected(n: usize, edges: &[(usize, usize)]) -> bool {
        let mut sets = UnionFind::<usize>::new(n);
        for &(a, b) in edges {
            sets.union(a, b);
        }
        (0..n).all(|i| sets.equiv(0, i))
    }

    /// Deterministic xorshift scatter of distinct points
    fn scatter(seed: u64, count: usize, mut place: impl FnMut(u64) -> (i32, i32)) -> Vec<Point> {
        let mut state = seed;
        let mut coords = BTreeSet::new();
        while coords.len() < count {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            coords.insert(place(state));
        }
        pts(&coords.into_iter().collect::<Vec<_>>())
    }

    fn kruskal_weight(points: &[Point], edges: &[(usize, usize)]) -> u128 {
        let mut sorted: Vec<(u64, usize, usize)> = edges
            .iter()
            .map(|&(a, b)| (points[a].distance_2(&points[b]), a, b))
            .collect();
        sorted.sort_unstable();
        let mut sets = UnionFind::<usize>::new(points.len());
        sorted
            .into_iter()
            .filter(|&(_, a, b)| sets.union(a, b))
            .map(|(w, _, _)| u128::from(w))
            .sum()
    }

    /// O(n^2) Prim over the complete graph
    fn prim_weight(points: &[Point]) -> u128 {
        let n = points.len();
        let mut best = vec![u64::MAX; n];
        let mut done = vec![false; n];
        best[0] = 0;
        let mut total = 0u128;
        for _ in 0..n {
            let Some(u) = (0..n).filter(|&i| !done[i]).min_by_key(|&i| best[i]) else {
                break;
            };
            done[u] = true;
            total += u128::from(best[u]);
            for v in 0..n {
                if !done[v] {
                    best[v] = best[v].min(points[u].distance_2(&points[v]));
                }
            }
        }
        total
    }

    #[test]
    fn test_triangle() {
        let edges = delaunay_edges(&pts(&[(0, 0), (100, 0), (50, 80)]));
        assert_eq!(edges, vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn test_square_has_one_diagonal() {
        let edges = delaunay_edges(&pts(&[(0, 0), (100, 0), (100, 100), (0, 100)]));
        assert_eq!(edges.len(), 5, "four sides plus one diagonal: {:?}", edges);
    }

    #[test]
    fn test_prefers_short_diagonal() {
        // Flat diamond: the vertical diagonal is the Delaunay one
        let edges = delaunay_edges(&pts(&[(0, 0), (400, 0), (200, 100), (200, -100)]));
        assert!(edges.contains(&(2, 3)), "{:?}", edges);
        assert!(!edges.contains(&(0, 1)), "{:?}", edges);
    }

    #[test]
    fn test_collinear_points_form_a_chain() {
        let edges = delaunay_edges(&pts(&[(0, 0), (300, 0), (100, 0), (200, 0)]));
        assert_eq!(edges, vec![(0, 2), (1, 3), (2, 3)]);
    }

    #[test]
    fn test_point_on_edge_is_split() {
        // (50, 0) lies on the hull edge of the first triangle
        let points = pts(&[(0, 0), (100, 0), (50, 100), (50, 0)]);
        let edges = delaunay_edges(&points);
        assert!(edges.contains(&(0, 3)));
        assert!(edges.contains(&(1, 3)));
        assert!(edges.contains(&(2, 3)));
        assert!(!edges.contains(&(0, 1)), "split edge must disappear: {:?}", edges);
    }

    #[test]
    fn test_collinear_prefix_then_off_line_point() {
        let points = pts(&[(0, 0), (100, 0), (200, 0), (300, 0), (150, 50)]);
        let edges = delaunay_edges(&points);
        for chain in [(0, 1), (1, 2), (2, 3)] {
            assert!(edges.contains(&chain), "{:?}", edges);
        }
        assert!(!edges.contains(&(0, 3)), "{:?}", edges);
    }

    #[test]
    fn test_grid_is_spanned() {
        let mut coords = Vec::new();
        for i in 0..12 {
            for j in 0..9 {
                coords.push((i * 1_270_000, j * 2_540_000));
            }
        }
        let points = pts(&coords);
        let edges = delaunay_edges(&points);
        assert!(is_connected(points.len(), &edges));
        // Planar graph bound
        assert!(edges.len() <= 3 * points.len() - 6);
        // Every grid neighbour pair along x is a Delaunay edge
        assert!(edges.contains(&(0, 9)));
    }

    #[test]
    fn test_scattered_points_are_spanned() {
        let points = scatter(0x2545_f491_4f6c_dd1d, 200, |s| {
            ((s % 50_000_000) as i32 - 25_000_000, ((s >> 32) % 50_000_000) as i32 - 25_000_000)
        });
        let edges = delaunay_edges(&points);
        assert!(is_connected(points.len(), &edges));
        assert!(edges.len() <= 3 * points.len() - 6);
        assert!(edges.len() >= points.len() - 1);
        assert_eq!(kruskal_weight(&points, &edges), prim_weight(&points));
    }

    #[test]
    fn test_far_apart_clusters_keep_minimum_spanning_tree() {
        // Two tight clusters near the ends of the coordinate range
        for (seed, offset) in [(0x9e37_79b9_7f4a_7c15u64, 2_000_000_000), (0xdead_beef_cafe_f00d, 200_000_000)] {
            let points = scatter(seed, 120, |s| {
                let side = if s & 1 == 0 { -offset } else { offset };
                (side + ((s >> 8) % 1000) as i32, ((s >> 24) % 1000) as i32)
            });
            let edges = delaunay_edges(&points);
            assert_eq!(
                kruskal_weight(&points, &edges),
                prim_weight(&points),
                "candidate edges miss a spanning tree edge at offset {}",
                offset
            );
        }
    }

    #[test]
    fn test_clustered_grid_keeps_minimum_spanning_tree() {
        let points = scatter(0x0123_4567_89ab_cdef, 150, |s| {
            let cluster = (s % 5) as i32;
            (cluster * 400_000_000 + ((s >> 16) % 64) as i32, ((s >> 40) % 64) as i32 * 3)
        });
        let edges = delaunay_edges(&points);
        assert_eq!(kruskal_weight(&points, &edges), prim_weight(&points));
    }
}
