//! Splits the body/equation graph into independently solvable islands.
//!
//! The graph is rebuilt every step from pooled nodes, one per body, with
//! neighbor lists holding body indices. Islands are grown breadth-first
//! from dynamic bodies. Static and kinematic bodies are never part of an
//! island: they link to any number of dynamic bodies without merging their
//! islands, and an equation touching one lands in the island of its
//! dynamic endpoint.

use std::collections::VecDeque;

use crate::dynamics::Body;
use crate::utils::{Pool, PoolHandle, Poolable};

#[derive(Clone, Debug, Default)]
pub struct IslandNode {
    pub body: usize,
    /// Bodies sharing at least one equation with this one.
    pub neighbors: Vec<usize>,
    pub equations: Vec<usize>,
    pub visited: bool,
}

impl Poolable for IslandNode {
    fn reset(&mut self) {
        self.body = 0;
        self.neighbors.clear();
        self.equations.clear();
        self.visited = false;
    }
}

/// One connected component: body indices and equation indices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Island {
    pub bodies: Vec<usize>,
    pub equations: Vec<usize>,
}

impl Poolable for Island {
    fn reset(&mut self) {
        self.bodies.clear();
        self.equations.clear();
    }
}

impl Island {
    /// True when every dynamic body asks to sleep.
    pub fn wants_to_sleep(&self, bodies: &[Body]) -> bool {
        self.bodies
            .iter()
            .map(|&i| &bodies[i])
            .all(|b| !b.is_dynamic() || b.wants_to_sleep)
    }

    pub fn sleep(&self, bodies: &mut [Body]) {
        for &i in &self.bodies {
            if bodies[i].is_dynamic() {
                bodies[i].sleep();
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct IslandManager {
    node_pool: Pool<IslandNode>,
    island_pool: Pool<Island>,
    nodes: Vec<PoolHandle>,
    islands: Vec<PoolHandle>,
    queue: VecDeque<usize>,
    equation_seen: Vec<bool>,
}

impl IslandManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Partition `bodies` using the body pairs of each equation, in
    /// equation order. Returns the islands, valid until the next split.
    pub fn split<I>(&mut self, bodies: &[Body], equations: I) -> Vec<&Island>
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        self.release_all();

        for i in 0..bodies.len() {
            let h = self.node_pool.get();
            self.node_pool.get_mut(h).body = i;
            self.nodes.push(h);
        }

        let mut equation_count = 0;
        for (k, (a, b)) in equations.into_iter().enumerate() {
            let na = self.node_pool.get_mut(self.nodes[a]);
            na.neighbors.push(b);
            na.equations.push(k);
            let nb = self.node_pool.get_mut(self.nodes[b]);
            nb.neighbors.push(a);
            nb.equations.push(k);
            equation_count = k + 1;
        }

        self.equation_seen.clear();
        self.equation_seen.resize(equation_count, false);

        let mut cursor = 0;
        while let Some(root) = self.next_unvisited_dynamic(bodies, &mut cursor) {
            let island = self.island_pool.get();
            self.bfs(bodies, root, island);
            self.islands.push(island);
        }

        log::trace!(
            "Split {} bodies and {} equations into {} islands.",
            bodies.len(),
            equation_count,
            self.islands.len()
        );
        self.islands()
    }

    pub fn islands(&self) -> Vec<&Island> {
        self.islands.iter().map(|&h| self.island_pool.get_ref(h)).collect()
    }

    pub fn node(&self, body: usize) -> Option<&IslandNode> {
        self.nodes.get(body).map(|&h| self.node_pool.get_ref(h))
    }

    fn release_all(&mut self) {
        for h in self.nodes.drain(..) {
            self.node_pool.release(h);
        }
        for h in self.islands.drain(..) {
            self.island_pool.release(h);
        }
    }

    fn next_unvisited_dynamic(&self, bodies: &[Body], cursor: &mut usize) -> Option<usize> {
        while *cursor < self.nodes.len() {
            let i = *cursor;
            *cursor += 1;
            if bodies[i].is_dynamic() && !self.node_pool.get_ref(self.nodes[i]).visited {
                return Some(i);
            }
        }
        None
    }

    fn bfs(&mut self, bodies: &[Body], root: usize, island: PoolHandle) {
        self.queue.clear();
        self.queue.push_back(root);
        self.visit(root, island);

        while let Some(n) = self.queue.pop_front() {
            let neighbor_count = self.node_pool.get_ref(self.nodes[n]).neighbors.len();
            for k in 0..neighbor_count {
                let child = self.node_pool.get_ref(self.nodes[n]).neighbors[k];
                if self.node_pool.get_ref(self.nodes[child]).visited || !bodies[child].is_dynamic() {
                    continue;
                }
                self.visit(child, island);
                self.queue.push_back(child);
            }
        }
    }

    fn visit(&mut self, n: usize, island: PoolHandle) {
        let node = self.node_pool.get_mut(self.nodes[n]);
        node.visited = true;

        let island = self.island_pool.get_mut(island);
        island.bodies.push(node.body);
        for &eq in &node.equations {
            if !self.equation_seen[eq] {
                self.equation_seen[eq] = true;
                island.equations.push(eq);
            }
        }
    }
}
