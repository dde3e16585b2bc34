use crate::error::DrillError;
use itertools::Itertools;
use rand::{seq::index, Rng};
use std::fs;
use std::path::{Path, PathBuf};

/// The union of every word list found in a directory
#[derive(Debug, Clone, PartialEq)]
pub struct WordList {
    pub dir: PathBuf,
    pub words: Vec<String>,
}

impl WordList {
    /// Read every `.txt` file directly under `dir`, one word per non-empty line.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self, DrillError> {
        let dir = dir.as_ref().to_path_buf();
        let list_err = |source| DrillError::ListsDir {
            path: dir.clone(),
            source,
        };

        let files: Vec<PathBuf> = fs::read_dir(&dir)
            .map_err(list_err)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "txt"))
            .sorted()
            .collect();

        let mut lines = Vec::new();
        for path in &files {
            let contents = fs::read_to_string(path).map_err(|source| DrillError::ListsDir {
                path: path.clone(),
                source,
            })?;
            lines.extend(
                contents
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string),
            );
        }

        tracing::debug!(files = files.len(), lines = lines.len(), dir = %dir.display(), "loaded word lists");

        Ok(Self::from_words(dir, lines))
    }

    /// Build a list from raw candidates, keeping the first occurrence of each word.
    pub fn from_words<I, S>(dir: PathBuf, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words = candidates
            .into_iter()
            .map(Into::into)
            .filter(|w: &String| !w.trim().is_empty())
            .unique()
            .collect();
        Self { dir, words }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Draw `n` distinct words uniformly at random, in presentation order.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<String>, DrillError> {
        if self.words.len() < n || self.words.is_empty() {
            return Err(DrillError::InsufficientWords {
                needed: n,
                found: self.words.len(),
                dir: self.dir.clone(),
            });
        }

        Ok(index::sample(rng, self.words.len(), n)
            .into_iter()
            .map(|i| self.words[i].clone())
            .collect())
    }
}

/// Load the lists under `dir` and pick `n` words for a session.
pub fn sample<P: AsRef<Path>>(n: usize, dir: P) -> Result<Vec<String>, DrillError> {
    WordList::load(dir)?.sample(n, &mut rand::thread_rng())
}
