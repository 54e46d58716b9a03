use std::{
    collections::VecDeque,
    ops::{Deref, DerefMut},
};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{error::Result, grid::Cell, Grid};

/// Supertrait that collects all the requirements on the NodeReference values
/// Must be copy, comparable and not references (hence 'static)
pub trait NodeReference: Copy + Eq + 'static {}

pub trait MapTrait {
    /// The type that can be used to reference nodes in the map
    type Reference: NodeReference;

    /// The type that the map uses for storage
    type Storage<T: Default + Copy + Clone + 'static>: MapStorage<T, Reference = Self::Reference>;

    /// Return an iterator over the nodes reachable in one step from the provided node, in the
    /// order they should be explored
    fn neighbors_of(&self, node: Self::Reference) -> impl Iterator<Item = Self::Reference>;

    /// Create a storage for values of type T
    fn create_storage<T: Default + Copy + Clone + 'static>(&self) -> Self::Storage<T>;
}

pub trait MapStorage<T> {
    type Reference: NodeReference;

    fn get(&self, node: Self::Reference) -> T;
    fn get_mut(&mut self, node: Self::Reference) -> &mut T;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisitedItem<R> {
    /// Number of steps from the start node
    pub depth: usize,
    pub from: Option<R>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Visited<R>(Option<VisitedItem<R>>);

impl<R> Default for Visited<R> {
    fn default() -> Self {
        Visited(None)
    }
}
impl<R> Deref for Visited<R> {
    type Target = Option<VisitedItem<R>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
impl<R> DerefMut for Visited<R> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[derive(Debug, PartialEq, Clone, Eq)]
pub struct PathResult<R> {
    pub path: Vec<R>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathFinderState<R> {
    Computing,
    NoPathFound,
    PathFound(PathResult<R>),
}

impl<R> PathFinderState<R> {
    pub fn is_done(&self) -> bool {
        !matches!(self, PathFinderState::Computing)
    }
}

/// Breadth-first search over a [`MapTrait`], one frontier node per [`PathFinder::step`].
///
/// A node counts as visited the moment it is admitted to the frontier, and the start node is
/// counted before the first step. The map is only borrowed for the duration of each call and
/// must not change between calls.
pub struct PathFinder<M: MapTrait> {
    goal: M::Reference,
    visited: M::Storage<Visited<M::Reference>>,
    frontier: VecDeque<M::Reference>,
    visited_count: usize,
    state: PathFinderState<M::Reference>,
}

impl<M: MapTrait> PathFinder<M> {
    /// `start` must be valid in `map`.
    pub fn new(map: &M, start: M::Reference, goal: M::Reference) -> Self {
        let mut visited = map.create_storage::<Visited<M::Reference>>();
        *visited.get_mut(start) = Visited(Some(VisitedItem {
            depth: 0,
            from: None,
        }));

        Self {
            goal,
            visited,
            frontier: VecDeque::from([start]),
            visited_count: 1,
            state: PathFinderState::Computing,
        }
    }

    /// Steps until the search either reaches the goal or runs out of nodes
    pub fn finish(&mut self, map: &M) -> PathFinderState<M::Reference> {
        loop {
            match self.step(map) {
                PathFinderState::Computing => {}
                s => return s,
            }
        }
    }

    pub fn step(&mut self, map: &M) -> PathFinderState<M::Reference> {
        if self.state.is_done() {
            return self.state.clone();
        }

        let Some(current) = self.frontier.pop_front() else {
            self.state = PathFinderState::NoPathFound;
            return self.state.clone();
        };

        if current == self.goal {
            self.state = PathFinderState::PathFound(PathResult {
                path: self.backtrack(current),
            });
            return self.state.clone();
        }

        let depth = self
            .visited
            .get(current)
            .as_ref()
            .map_or(0, |item| item.depth);

        for next in map.neighbors_of(current) {
            if self.visited.get(next).is_none() {
                *self.visited.get_mut(next) = Visited(Some(VisitedItem {
                    depth: depth + 1,
                    from: Some(current),
                }));
                self.visited_count += 1;
                self.frontier.push_back(next);
            }
        }

        self.state.clone()
    }

    /// Walks the recorded predecessors from `goal` back to the start
    fn backtrack(&self, goal: M::Reference) -> Vec<M::Reference> {
        let mut path = vec![goal];
        let mut at = goal;

        while let Some(VisitedItem {
            from: Some(from), ..
        }) = *self.visited.get(at)
        {
            path.push(from);
            at = from;
        }

        path.reverse();
        path
    }

    pub fn state(&self) -> &PathFinderState<M::Reference> {
        &self.state
    }

    pub fn get_visited(&self) -> &M::Storage<Visited<M::Reference>> {
        &self.visited
    }

    /// Number of distinct nodes admitted so far, the start node included
    pub fn visited_count(&self) -> usize {
        self.visited_count
    }

    pub fn frontier_len(&self) -> usize {
        self.frontier.len()
    }
}

/// Outcome of [`solve`]. `path` is `None` when `end` cannot be reached from `start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub path: Option<Vec<Cell>>,
    pub visited_count: usize,
}

/// Finds a shortest 4-connected path from `start` to `end`.
///
/// Both cells must lie inside `grid`, otherwise [`crate::Error::OutOfBounds`] is returned. Wall
/// endpoints are not rejected: a search starting on a wall never expands and a wall goal is never
/// admitted, so the only way to succeed from a wall is `start == end`. Callers that want to
/// refuse wall endpoints must check [`Grid::is_passable`] themselves.
pub fn solve(grid: &Grid, start: Cell, end: Cell) -> Result<SearchResult> {
    grid.check(start)?;
    grid.check(end)?;

    let mut finder = PathFinder::new(grid, start, end);
    let path = match finder.finish(grid) {
        PathFinderState::PathFound(found) => Some(found.path),
        _ => None,
    };

    debug!(
        "solved {} -> {}: {} cells on path, {} visited",
        start,
        end,
        path.as_ref().map_or(0, Vec::len),
        finder.visited_count()
    );

    Ok(SearchResult {
        path,
        visited_count: finder.visited_count(),
    })
}
