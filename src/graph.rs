//! Random 3-hypergraph construction, peeling and assignment.
//!
//! Every key becomes an edge joining three vertices picked by hashing the key
//! with a candidate seed. If the hypergraph can be peeled completely, walking
//! the peeling order backwards yields a displacement array `g` such that
//! `(g[v0] + g[v1] + g[v2]) % data_count` is the data index of every key.

use crate::error::Result;
use crate::hasher::vector_hash;
use crate::keys::KeyTable;

/// Number of vertices per edge. Each vertex keeps one edge list per role.
const ROLES: usize = 3;

/// Reason a seed was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rejection {
    /// Two vertices of one edge coincide.
    DegenerateEdge,
    /// Peeling stalled with edges left on a cycle.
    NotPeelable { remaining: usize },
}

#[derive(Debug)]
pub(crate) enum Outcome {
    /// The displacement array, one value per vertex.
    Solved(Vec<u32>),
    Rejected(Rejection),
}

#[derive(Debug, Default, Clone, Copy)]
struct Link {
    prev: Option<u32>,
    next: Option<u32>,
}

#[derive(Debug)]
struct Edge {
    data_index: u32,
    vertices: [u32; ROLES],
    links: [Link; ROLES],
}

#[derive(Debug, Default, Clone, Copy)]
struct Vertex {
    heads: [Option<u32>; ROLES],
}

/// Per-attempt build state. Dropped as a whole whether the attempt succeeds
/// or not.
#[derive(Debug)]
struct Hypergraph {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    /// Peeled edges, filled from the back.
    removal_order: Vec<u32>,
    remaining: usize,
}

impl Hypergraph {
    fn with_capacity(entries: u32, edges: usize) -> Result<Self> {
        let mut vertices = Vec::new();
        vertices.try_reserve_exact(entries as usize)?;
        vertices.resize(entries as usize, Vertex::default());
        let mut edge_vec = Vec::new();
        edge_vec.try_reserve_exact(edges)?;
        let mut removal_order = Vec::new();
        removal_order.try_reserve_exact(edges)?;
        removal_order.resize(edges, 0);
        Ok(Self {
            vertices,
            edges: edge_vec,
            removal_order,
            remaining: 0,
        })
    }

    fn add_edge(&mut self, data_index: u32, vertices: [u32; ROLES]) {
        let id = self.edges.len() as u32;
        let mut links = [Link::default(); ROLES];
        for (role, &v) in vertices.iter().enumerate() {
            let head = &mut self.vertices[v as usize].heads[role];
            links[role].next = *head;
            if let Some(old) = head.replace(id) {
                self.edges[old as usize].links[role].prev = Some(id);
            }
        }
        self.edges.push(Edge {
            data_index,
            vertices,
            links,
        });
        self.remaining += 1;
    }

    /// The only edge incident on `v` across all roles, if its degree is one.
    fn sole_edge(&self, v: u32) -> Option<u32> {
        let mut found = None;
        for (role, head) in self.vertices[v as usize].heads.iter().enumerate() {
            if let Some(e) = *head {
                if found.is_some() || self.edges[e as usize].links[role].next.is_some() {
                    return None;
                }
                found = Some(e);
            }
        }
        found
    }

    fn remove_edge(&mut self, e: u32) {
        self.remaining -= 1;
        self.removal_order[self.remaining] = e;
        for role in 0..ROLES {
            let Link { prev, next } = self.edges[e as usize].links[role];
            match prev {
                Some(p) => self.edges[p as usize].links[role].next = next,
                None => {
                    let v = self.edges[e as usize].vertices[role];
                    self.vertices[v as usize].heads[role] = next;
                }
            }
            if let Some(n) = next {
                self.edges[n as usize].links[role].prev = prev;
            }
        }
    }

    /// Peels every vertex of degree one, cascading into the neighbours of each
    /// removed edge. Returns whether all edges were removed.
    fn peel(&mut self) -> bool {
        let mut stack = Vec::new();
        for v in 0..self.vertices.len() as u32 {
            stack.push(v);
            while let Some(v) = stack.pop() {
                if let Some(e) = self.sole_edge(v) {
                    self.remove_edge(e);
                    stack.extend_from_slice(&self.edges[e as usize].vertices);
                }
            }
        }
        self.remaining == 0
    }

    /// Replays the removal order backwards, solving one vertex per edge.
    fn assign(&self, data_entries: u32) -> Result<Vec<u32>> {
        let n = self.vertices.len();
        let mut g = Vec::new();
        g.try_reserve_exact(n)?;
        g.resize(n, 0u32);
        let mut visited = Vec::new();
        visited.try_reserve_exact(n)?;
        visited.resize(n, false);

        let modulus = data_entries as u64;
        for &e in &self.removal_order {
            let edge = &self.edges[e as usize];
            let [a, b, c] = edge.vertices.map(|v| v as usize);
            let (pivot, x, y) = if !visited[a] {
                (a, b, c)
            } else if !visited[b] {
                (b, a, c)
            } else {
                (c, a, b)
            };
            debug_assert!(!visited[pivot], "edge {e} has no free vertex");
            let value = 2 * modulus + edge.data_index as u64 - g[x] as u64 - g[y] as u64;
            g[pivot] = (value % modulus) as u32;
            visited[a] = true;
            visited[b] = true;
            visited[c] = true;
        }
        Ok(g)
    }
}

/// Number of vertices used for `keys` keys: 1.25 times the key count, at
/// least 10.
pub(crate) fn vertex_count(keys: u32) -> u32 {
    (keys + keys.div_ceil(4)).max(10)
}

/// Runs one construction attempt with `seed`.
///
/// Only allocation failures are errors; a seed that does not yield a peelable
/// hypergraph is reported as [`Outcome::Rejected`].
pub(crate) fn solve(keys: &KeyTable, data_entries: u32, entries: u32, seed: u32) -> Result<Outcome> {
    let mut graph = Hypergraph::with_capacity(entries, keys.len())?;
    for key in keys.iter() {
        let [v0, v1, v2] = vector_hash(&key.key, seed).map(|h| h % entries);
        if v0 == v1 || v0 == v2 || v1 == v2 {
            return Ok(Outcome::Rejected(Rejection::DegenerateEdge));
        }
        graph.add_edge(key.data_index, [v0, v1, v2]);
    }

    if !graph.peel() {
        return Ok(Outcome::Rejected(Rejection::NotPeelable {
            remaining: graph.remaining,
        }));
    }
    Ok(Outcome::Solved(graph.assign(data_entries)?))
}
