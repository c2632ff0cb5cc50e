//! Relocation passes that move unhappy residents into vacancies.

use crate::grid::Grid;
use rand::Rng;
use schelling_core::{Cell, Coord, Move, StepKind};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

/// What a relocation pass did to the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelocationOutcome {
    pub kind: StepKind,
    /// Moves in the order they were applied
    pub moves: Vec<Move>,
    /// Moves that were checked to leave the resident happy
    pub greedy_moves: usize,
    /// Unhappy residents left where they were
    pub unplaced: usize,
    /// Vacancies still empty after the pass
    pub unfilled: usize,
}

impl RelocationOutcome {
    fn new(kind: StepKind) -> Self {
        Self {
            kind,
            moves: Vec::new(),
            greedy_moves: 0,
            unplaced: 0,
            unfilled: 0,
        }
    }
}

/// Vacancies and unhappy residents collected in one row-major scan
struct Pools {
    vacant: Vec<Coord>,
    unhappy: Vec<Coord>,
}

fn collect_pools(grid: &Grid) -> Pools {
    let mut pools = Pools {
        vacant: Vec::new(),
        unhappy: Vec::new(),
    };

    for (coord, cell) in grid.iter() {
        if cell.is_vacant() {
            pools.vacant.push(coord);
        } else if !grid.is_happy_at(coord) {
            pools.unhappy.push(coord);
        }
    }
    pools
}

/// Pair unhappy residents with vacancies uniformly at random until either
/// pool runs dry. No happiness check at the destination.
fn pair_randomly<R: Rng + ?Sized>(
    grid: &mut Grid,
    mut unhappy: Vec<Coord>,
    mut vacant: Vec<Coord>,
    rng: &mut R,
    outcome: &mut RelocationOutcome,
) {
    while !unhappy.is_empty() && !vacant.is_empty() {
        let from = unhappy.swap_remove(rng.gen_range(0..unhappy.len()));
        let to = vacant.swap_remove(rng.gen_range(0..vacant.len()));
        outcome.moves.push(grid.relocate(from, to));
    }
    outcome.unplaced = unhappy.len();
    outcome.unfilled = vacant.len();
}

/// Every unhappy resident moves to a random vacancy, whether or not it will
/// be happy there.
pub fn random_step<R: Rng + ?Sized>(grid: &mut Grid, rng: &mut R) -> RelocationOutcome {
    let Pools { vacant, unhappy } = collect_pools(grid);
    debug!(
        vacant = vacant.len(),
        unhappy = unhappy.len(),
        "Random relocation pass"
    );

    let mut outcome = RelocationOutcome::new(StepKind::Random);
    pair_randomly(grid, unhappy, vacant, rng, &mut outcome);
    outcome
}

/// Each unhappy resident, in scan order, takes the first vacancy (in scan
/// order) where it would be happy. Residents with no such vacancy are then
/// paired with the remaining vacancies at random.
pub fn group_step<R: Rng + ?Sized>(grid: &mut Grid, rng: &mut R) -> RelocationOutcome {
    let Pools { vacant, unhappy } = collect_pools(grid);
    let mut outcome = RelocationOutcome::new(StepKind::Group);

    let mut taken = vec![false; vacant.len()];
    let mut leftover = Vec::new();

    for from in unhappy {
        let cell = grid.at(from);

        // Probe with the resident still standing at its origin
        let slot = (0..vacant.len()).filter(|&i| !taken[i]).find(|&i| {
            let to = vacant[i];
            grid.put(to, cell);
            let happy = grid.is_happy_at(to);
            grid.put(to, Cell::Vacant);
            happy
        });

        match slot {
            Some(i) => {
                taken[i] = true;
                outcome.moves.push(grid.relocate(from, vacant[i]));
                outcome.greedy_moves += 1;
            }
            None => leftover.push(from),
        }
    }

    let remaining: Vec<Coord> = vacant
        .into_iter()
        .zip(taken)
        .filter(|&(_, used)| !used)
        .map(|(coord, _)| coord)
        .collect();

    debug!(
        greedy_moves = outcome.greedy_moves,
        leftover = leftover.len(),
        remaining_vacant = remaining.len(),
        "Group relocation greedy pass done"
    );

    pair_randomly(grid, leftover, remaining, rng, &mut outcome);
    outcome
}

/// Sweep order over a `size` x `size` grid.
///
/// The first half walks anti-diagonals out from the top-left corner up to and
/// including the main anti-diagonal, each from its top-right end to its
/// bottom-left end. The second half walks the remaining anti-diagonals from
/// the one next to the main anti-diagonal down to the bottom-right corner,
/// each from its bottom-left end to its top-right end. Every square is visited
/// once.
pub fn sweep_order(size: usize) -> impl Iterator<Item = Coord> {
    let n = size as i32;
    let upper = (1..=n).flat_map(move |diag| (0..diag).map(move |k| Coord::new(k, diag - 1 - k)));
    let lower = (1..n)
        .rev()
        .flat_map(move |diag| (0..diag).map(move |k| Coord::new(n - 1 - k, n - diag + k)));
    upper.chain(lower)
}

/// Deterministic corner-sorting pass. Unhappy residents are taken in sweep
/// order; type A fills the earliest-swept vacancy, type B the latest. No
/// happiness check at the destination.
pub fn diagonal_sweep_step(grid: &mut Grid) -> RelocationOutcome {
    let mut vacant = VecDeque::new();
    let mut unhappy = Vec::new();

    for coord in sweep_order(grid.size()) {
        match grid.at(coord) {
            Cell::Vacant => vacant.push_back(coord),
            cell if !grid.is_happy_at(coord) => unhappy.push((coord, cell)),
            _ => {}
        }
    }

    debug!(
        vacant = vacant.len(),
        unhappy = unhappy.len(),
        "Diagonal sweep pass"
    );

    let mut outcome = RelocationOutcome::new(StepKind::DiagonalSweep);
    let mut pending = unhappy.into_iter();

    while !vacant.is_empty() {
        let Some((from, cell)) = pending.next() else {
            break;
        };
        let target = match cell {
            Cell::TypeA => vacant.pop_front(),
            _ => vacant.pop_back(),
        };
        if let Some(to) = target {
            outcome.moves.push(grid.relocate(from, to));
        }
    }

    outcome.unplaced = pending.count();
    outcome.unfilled = vacant.len();
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use schelling_core::GridConfig;
    use std::collections::HashSet;

    fn random_grid(size: usize, vacant: f64, threshold: f64, seed: u64) -> Grid {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let config = GridConfig {
            size,
            neighborhood_distance: 1,
            fraction_vacant: vacant,
            fraction_red: 0.5,
            happiness_threshold: threshold,
        };
        Grid::from_config(&config, &mut rng).unwrap()
    }

    fn census(grid: &Grid) -> (usize, usize, usize) {
        (
            grid.count(Cell::TypeA),
            grid.count(Cell::TypeB),
            grid.count(Cell::Vacant),
        )
    }

    /// Sources are distinct unhappy residents, targets distinct vacancies
    fn assert_moves_consistent(before: &Grid, after: &Grid, outcome: &RelocationOutcome) {
        let sources: HashSet<Coord> = outcome.moves.iter().map(|m| m.from).collect();
        let targets: HashSet<Coord> = outcome.moves.iter().map(|m| m.to).collect();
        assert_eq!(sources.len(), outcome.moves.len(), "resident moved twice");
        assert_eq!(targets.len(), outcome.moves.len(), "vacancy filled twice");
        assert!(sources.is_disjoint(&targets));

        for m in &outcome.moves {
            assert_eq!(before.at(m.from), m.cell);
            assert!(!before.is_happy_at(m.from));
            assert!(before.at(m.to).is_vacant());
            assert_eq!(after.at(m.to), m.cell);
            assert!(after.at(m.from).is_vacant());
        }
    }

    #[test]
    fn test_sweep_order_3x3() {
        let order: Vec<(i32, i32)> = sweep_order(3).map(|c| (c.row, c.col)).collect();
        assert_eq!(
            order,
            vec![
                (0, 0),
                (0, 1),
                (1, 0),
                (0, 2),
                (1, 1),
                (2, 0),
                (2, 1),
                (1, 2),
                (2, 2),
            ]
        );
    }

    #[test]
    fn test_sweep_order_covers_grid_once() {
        for size in [1usize, 2, 5, 8] {
            let seen: Vec<Coord> = sweep_order(size).collect();
            let unique: HashSet<Coord> = seen.iter().copied().collect();
            assert_eq!(seen.len(), size * size);
            assert_eq!(unique.len(), size * size);
            assert!(seen.iter().all(|c| c.in_bounds(size)));
        }
        assert_eq!(sweep_order(0).count(), 0);
    }

    #[test]
    fn test_random_step_moves_every_unhappy_resident() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut grid = random_grid(15, 0.8, 0.05, 5);
        let before = grid.clone();
        let unhappy = before.stats().unhappy;

        let outcome = random_step(&mut grid, &mut rng);

        // more vacancies than residents, so everyone unhappy moves
        assert_eq!(outcome.moves.len(), unhappy);
        assert_eq!(outcome.unplaced, 0);
        assert_eq!(outcome.greedy_moves, 0);
        assert_eq!(census(&before), census(&grid));
        assert_moves_consistent(&before, &grid, &outcome);
    }

    #[test]
    fn test_random_step_limited_by_vacancies() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        // two vacancies, everyone unhappy at threshold 1.0 on a mixed grid
        let mut grid = Grid::from_rows(&["RBR", "B.B", "RB."], 1, 1.0);
        let before = grid.clone();

        let outcome = random_step(&mut grid, &mut rng);
        assert_eq!(outcome.moves.len(), 2);
        assert_eq!(outcome.unfilled, 0);
        assert_eq!(outcome.unplaced, 5);
        assert_eq!(census(&before), census(&grid));
        assert_moves_consistent(&before, &grid, &outcome);
    }

    #[test]
    fn test_group_step_prefers_happy_vacancy() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        // both Bs are unhappy. The one at (0,0) is happy at (3,3), next to
        // the other B; the one at (2,3) then has only (0,3) left, where it is
        // not happy, and lands there in the random pass.
        let mut grid = Grid::from_rows(&["BRR.", "RRRR", "RRRB", "RRR."], 1, 0.3);
        let before = grid.clone();

        let outcome = group_step(&mut grid, &mut rng);
        assert_eq!(outcome.greedy_moves, 1);
        assert_eq!(outcome.moves.len(), 2);
        assert_eq!(
            outcome.moves[0],
            Move {
                from: Coord::new(0, 0),
                to: Coord::new(3, 3),
                cell: Cell::TypeB,
            }
        );
        assert_eq!(grid.get_color(0, 3), Some(Cell::TypeB));
        assert_eq!(grid.get_color(0, 0), Some(Cell::Vacant));
        assert_eq!(grid.get_color(2, 3), Some(Cell::Vacant));
        assert_moves_consistent(&before, &grid, &outcome);
    }

    #[test]
    fn test_group_step_falls_back_to_random() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        // nobody can be happy at threshold 1.0 next to a vacancy
        let mut grid = Grid::from_rows(&["RB.", "BR.", "..."], 1, 1.0);
        let before = grid.clone();

        let outcome = group_step(&mut grid, &mut rng);
        assert_eq!(outcome.greedy_moves, 0);
        assert_eq!(outcome.moves.len(), 4);
        assert_eq!(outcome.unplaced, 0);
        assert_eq!(outcome.unfilled, 1);
        assert_eq!(census(&before), census(&grid));
        assert_moves_consistent(&before, &grid, &outcome);
    }

    #[test]
    fn test_group_step_converges() {
        let mut rng = ChaCha8Rng::seed_from_u64(20);
        let mut grid = random_grid(20, 0.2, 0.25, 20);
        for _ in 0..7 {
            group_step(&mut grid, &mut rng);
        }
        assert!(grid.fraction_happy() > 0.85);
    }

    #[test]
    fn test_diagonal_sweep_sorts_by_corner() {
        // both residents are unhappy at threshold 1.0
        let mut grid = Grid::from_rows(&["...", ".RB", "..."], 1, 1.0);
        let outcome = diagonal_sweep_step(&mut grid);

        // R takes the first vacancy swept (top-left), B the last (bottom-right)
        assert_eq!(grid.to_string(), "R..\n...\n..B\n");
        assert_eq!(outcome.moves.len(), 2);
        assert_eq!(outcome.unfilled, 5);
        assert_eq!(outcome.unplaced, 0);
    }

    #[test]
    fn test_diagonal_sweep_runs_out_of_vacancies() {
        let mut grid = Grid::from_rows(&["RB", "B."], 1, 1.0);
        let before = grid.clone();
        let outcome = diagonal_sweep_step(&mut grid);

        // sweep order (0,0) R, (0,1) B, (1,0) B: only R moves
        assert_eq!(outcome.moves.len(), 1);
        assert_eq!(outcome.moves[0].from, Coord::new(0, 0));
        assert_eq!(outcome.moves[0].to, Coord::new(1, 1));
        assert_eq!(outcome.unplaced, 2);
        assert_eq!(outcome.unfilled, 0);
        assert_moves_consistent(&before, &grid, &outcome);
    }

    #[test]
    fn test_diagonal_sweep_improves_happiness() {
        let mut grid = random_grid(20, 0.2, 0.25, 3);
        let before = grid.clone();
        let outcome = diagonal_sweep_step(&mut grid);
        assert_eq!(census(&before), census(&grid));
        assert_moves_consistent(&before, &grid, &outcome);

        for _ in 0..7 {
            diagonal_sweep_step(&mut grid);
        }
        assert!(grid.fraction_happy() > 0.8);
    }

    #[test]
    fn test_settled_grid_is_untouched() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut grid = Grid::from_rows(&["RR.", "RR.", "..."], 1, 0.3);
        let before = grid.clone();

        assert!(random_step(&mut grid, &mut rng).moves.is_empty());
        assert!(group_step(&mut grid, &mut rng).moves.is_empty());
        assert!(diagonal_sweep_step(&mut grid).moves.is_empty());
        assert_eq!(grid, before);
    }

    proptest! {
        #[test]
        fn prop_passes_preserve_population(
            size in 2usize..10,
            vacant in 0.05f64..0.6,
            threshold in 0.0f64..=1.0,
            seed in any::<u64>(),
            which in 0u8..3,
        ) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut grid = random_grid(size, vacant, threshold, seed);
            let before = grid.clone();

            let outcome = match which {
                0 => random_step(&mut grid, &mut rng),
                1 => group_step(&mut grid, &mut rng),
                _ => diagonal_sweep_step(&mut grid),
            };

            prop_assert_eq!(census(&before), census(&grid));
            let stats = before.stats();
            prop_assert_eq!(outcome.moves.len() + outcome.unplaced, stats.unhappy);
            prop_assert_eq!(outcome.moves.len() + outcome.unfilled, stats.vacant);
            assert_moves_consistent(&before, &grid, &outcome);
        }
    }
}
