// Word search puzzle generation

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, warn};

// ============================================================================
// Constants
// ============================================================================

/// Grid size used when the caller does not pick one
pub const DEFAULT_GRID_SIZE: usize = 15;

/// Largest grid that still prints legibly on one A4 page
pub const MAX_GRID_SIZE: usize = 30;

/// Random placements tried per word before it is dropped
pub const MAX_PLACEMENT_ATTEMPTS: usize = 100;

const LATIN_LETTERS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const THAI_CONSONANTS: &str = "กขฃคฅฆงจฉชซฌญฎฏฐฑฒณดตถทธนบปผฝพฟภมยรลวศษสหฬอฮ";

// ============================================================================
// Data Structures
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    East,
    South,
    SouthEast,
    NorthEast,
    West,
    North,
    NorthWest,
    SouthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::East,
        Direction::South,
        Direction::SouthEast,
        Direction::NorthEast,
        Direction::West,
        Direction::North,
        Direction::NorthWest,
        Direction::SouthWest,
    ];

    /// (row step, column step)
    pub fn delta(self) -> (isize, isize) {
        match self {
            Direction::East => (0, 1),
            Direction::South => (1, 0),
            Direction::SouthEast => (1, 1),
            Direction::NorthEast => (-1, 1),
            Direction::West => (0, -1),
            Direction::North => (-1, 0),
            Direction::NorthWest => (-1, -1),
            Direction::SouthWest => (1, -1),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::East => "right",
            Direction::South => "down",
            Direction::SouthEast => "down-right",
            Direction::NorthEast => "up-right",
            Direction::West => "left",
            Direction::North => "up",
            Direction::NorthWest => "up-left",
            Direction::SouthWest => "down-left",
        }
    }
}

/// Letters used for the noise cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FillAlphabet {
    Latin,
    Thai,
}

impl FillAlphabet {
    /// Thai consonants when any word is written in Thai script, Latin otherwise.
    pub fn for_words<S: AsRef<str>>(words: &[S]) -> Self {
        let has_thai = words
            .iter()
            .any(|w| w.as_ref().chars().any(|c| ('\u{0E00}'..='\u{0E7F}').contains(&c)));
        if has_thai {
            FillAlphabet::Thai
        } else {
            FillAlphabet::Latin
        }
    }

    fn letters(self) -> Vec<char> {
        match self {
            FillAlphabet::Latin => LATIN_LETTERS.chars().collect(),
            FillAlphabet::Thai => THAI_CONSONANTS.chars().collect(),
        }
    }
}

/// Where a placed word starts and which way it runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub word: String,
    pub row: usize,
    pub col: usize,
    pub direction: Direction,
}

impl Placement {
    /// Grid cells covered by the word, paired with the letter stored there.
    pub fn cells(&self) -> Vec<(usize, usize, char)> {
        let (dr, dc) = self.direction.delta();
        self.word
            .chars()
            .enumerate()
            .map(|(i, ch)| {
                let r = self.row as isize + dr * i as isize;
                let c = self.col as isize + dc * i as isize;
                (r as usize, c as usize, ch)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WordSearchPuzzle {
    pub grid: Vec<Vec<char>>,
    /// Normalized words in the order they were placed
    pub placed_words: Vec<String>,
    pub placements: Vec<Placement>,
    /// Words that could not be fitted after every attempt
    pub dropped_words: Vec<String>,
}

impl WordSearchPuzzle {
    pub fn size(&self) -> usize {
        self.grid.len()
    }

    /// Grid with every noise cell blanked out, used for the answer key.
    pub fn solution_grid(&self) -> Vec<Vec<Option<char>>> {
        let mut solution = vec![vec![None; self.size()]; self.size()];
        for placement in &self.placements {
            for (r, c, ch) in placement.cells() {
                solution[r][c] = Some(ch);
            }
        }
        solution
    }
}

// ============================================================================
// Grid Placer
// ============================================================================

/// Places words along straight runs in any of the 8 compass directions.
/// Crossing words may share a cell when they agree on the letter.
#[derive(Debug, Clone)]
pub struct GridPlacer {
    size: usize,
    alphabet: Option<FillAlphabet>,
    seed: Option<u64>,
}

impl Default for GridPlacer {
    fn default() -> Self {
        Self::new(DEFAULT_GRID_SIZE)
    }
}

impl GridPlacer {
    pub fn new(size: usize) -> Self {
        Self {
            size: size.max(1),
            alphabet: None,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_alphabet(mut self, alphabet: FillAlphabet) -> Self {
        self.alphabet = Some(alphabet);
        self
    }

    pub fn generate<S: AsRef<str>>(&self, words: &[S]) -> WordSearchPuzzle {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.generate_with(&mut rng, words)
    }

    pub fn generate_with<R: Rng, S: AsRef<str>>(&self, rng: &mut R, words: &[S]) -> WordSearchPuzzle {
        let size = self.size;
        let mut cells: Vec<Vec<Option<char>>> = vec![vec![None; size]; size];
        let mut placements = Vec::new();
        let mut dropped_words = Vec::new();

        for raw in words {
            let word = normalize_word(raw.as_ref());
            if word.is_empty() {
                continue;
            }

            match try_place(rng, &cells, &word) {
                Some(placement) => {
                    for (r, c, ch) in placement.cells() {
                        cells[r][c] = Some(ch);
                    }
                    placements.push(placement);
                }
                None => {
                    warn!(word = %word, size, "word did not fit in the grid, dropping it");
                    dropped_words.push(word);
                }
            }
        }

        let letters = self
            .alphabet
            .unwrap_or_else(|| FillAlphabet::for_words(words))
            .letters();

        let grid = cells
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| cell.unwrap_or_else(|| *letters.choose(rng).unwrap_or(&'X')))
                    .collect()
            })
            .collect();

        debug!(placed = placements.len(), dropped = dropped_words.len(), "word search generated");

        WordSearchPuzzle {
            grid,
            placed_words: placements.iter().map(|p| p.word.clone()).collect(),
            placements,
            dropped_words,
        }
    }
}

/// Uppercase with all whitespace removed.
pub fn normalize_word(word: &str) -> String {
    word.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

fn try_place<R: Rng>(rng: &mut R, cells: &[Vec<Option<char>>], word: &str) -> Option<Placement> {
    let size = cells.len();
    let letters: Vec<char> = word.chars().collect();
    if letters.len() > size {
        return None;
    }

    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let direction = *Direction::ALL.choose(rng)?;
        let row = rng.gen_range(0..size);
        let col = rng.gen_range(0..size);
        if fits(cells, &letters, row, col, direction) {
            return Some(Placement {
                word: word.to_string(),
                row,
                col,
                direction,
            });
        }
    }
    None
}

fn fits(cells: &[Vec<Option<char>>], letters: &[char], row: usize, col: usize, direction: Direction) -> bool {
    let size = cells.len() as isize;
    let (dr, dc) = direction.delta();
    letters.iter().enumerate().all(|(i, &ch)| {
        let r = row as isize + dr * i as isize;
        let c = col as isize + dc * i as isize;
        if r < 0 || r >= size || c < 0 || c >= size {
            return false;
        }
        match cells[r as usize][c as usize] {
            Some(existing) => existing == ch,
            None => true,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn placed_words_read_along_their_runs() {
        let input = words(&["apple", "banana", "orange", "grape", "mango", "kiwi"]);
        for seed in [1, 7, 42, 999, 31337] {
            let puzzle = GridPlacer::new(12).with_seed(Some(seed)).generate(&input);
            for placement in &puzzle.placements {
                for (r, c, ch) in placement.cells() {
                    assert_eq!(puzzle.grid[r][c], ch, "seed {seed}: {} broken at ({r},{c})", placement.word);
                }
            }
            assert_eq!(puzzle.placed_words.len() + puzzle.dropped_words.len(), input.len());
        }
    }

    #[test]
    fn grid_has_requested_size_and_no_blanks() {
        for size in [1, 5, 12, 20] {
            let puzzle = GridPlacer::new(size).with_seed(Some(3)).generate(&words(&["cat", "dog"]));
            assert_eq!(puzzle.grid.len(), size);
            assert!(puzzle.grid.iter().all(|row| row.len() == size));
            assert!(puzzle.grid.iter().flatten().all(|c| !c.is_whitespace()));
        }
    }

    #[test]
    fn words_are_normalized() {
        let puzzle = GridPlacer::new(15).with_seed(Some(5)).generate(&words(&["ice cream"]));
        assert_eq!(puzzle.placed_words, vec!["ICECREAM".to_string()]);
    }

    #[test]
    fn oversized_words_are_reported_as_dropped() {
        let puzzle = GridPlacer::new(4).with_seed(Some(11)).generate(&words(&["hippopotamus", "cat"]));
        assert_eq!(puzzle.dropped_words, vec!["HIPPOPOTAMUS".to_string()]);
        assert_eq!(puzzle.placed_words, vec!["CAT".to_string()]);
    }

    #[test]
    fn crowded_grid_drops_instead_of_overwriting() {
        let input = words(&["ab", "cd", "ef", "gh", "ij", "kl"]);
        let puzzle = GridPlacer::new(2).with_seed(Some(8)).generate(&input);
        assert!(puzzle.placed_words.len() <= 2 * 2);
        assert!(!puzzle.dropped_words.is_empty());
        for placement in &puzzle.placements {
            for (r, c, ch) in placement.cells() {
                assert_eq!(puzzle.grid[r][c], ch);
            }
        }
    }

    #[test]
    fn same_seed_same_puzzle() {
        let input = words(&["river", "mountain", "forest"]);
        let a = GridPlacer::new(10).with_seed(Some(77)).generate(&input);
        let b = GridPlacer::new(10).with_seed(Some(77)).generate(&input);
        assert_eq!(a.grid, b.grid);
        assert_eq!(a.placements, b.placements);
    }

    #[test]
    fn fill_alphabet_follows_word_script() {
        assert_eq!(FillAlphabet::for_words(&["CAT"]), FillAlphabet::Latin);
        assert_eq!(FillAlphabet::for_words(&["แมว", "DOG"]), FillAlphabet::Thai);

        let puzzle = GridPlacer::new(6).with_seed(Some(2)).generate(&words(&["แมว"]));
        let thai: Vec<char> = THAI_CONSONANTS.chars().collect();
        let solution = puzzle.solution_grid();
        for (r, row) in puzzle.grid.iter().enumerate() {
            for (c, ch) in row.iter().enumerate() {
                if solution[r][c].is_none() {
                    assert!(thai.contains(ch), "noise letter {ch} is not a Thai consonant");
                }
            }
        }
    }

    #[test]
    fn solution_grid_only_holds_placed_letters() {
        let puzzle = GridPlacer::new(8).with_seed(Some(21)).generate(&words(&["sun", "moon"]));
        let placed_cells: usize = puzzle.solution_grid().iter().flatten().filter(|c| c.is_some()).count();
        let letters: usize = puzzle.placed_words.iter().map(|w| w.chars().count()).sum();
        assert!(placed_cells <= letters);
        assert!(placed_cells > 0);
    }
}
