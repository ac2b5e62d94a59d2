//! Corpus discovery and deterministic partitioning.
//!
//! A corpus is a flat directory of `<id>.<ext>` text files. Documents are
//! listed in path order, shuffled with a fixed seed, optionally capped, and
//! split into equal-size contiguous partitions. Any remainder past the
//! last full partition is dropped so every round indexes the same number
//! of new documents.

use std::collections::HashMap;

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{BenchError, Result};
use crate::models::{CorpusConfig, DocumentRef, Partition};

/// Shape of a partitioning, reported by `bookbench partitions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionSummary {
    pub partitions: usize,
    pub partition_size: usize,
    pub documents_found: usize,
    pub documents_used: usize,
    pub documents_dropped: usize,
    pub first_ids: Vec<String>,
}

/// List, shuffle, cap, and split the corpus described by `config`.
pub fn get_partitions(config: &CorpusConfig) -> Result<Vec<Partition>> {
    partition_documents(list_documents(config)?, config)
}

fn partition_documents(
    mut documents: Vec<DocumentRef>,
    config: &CorpusConfig,
) -> Result<Vec<Partition>> {
    let found = documents.len();

    shuffle_documents(&mut documents, config.seed);

    if let Some(cap) = config.max_documents {
        documents.truncate(cap);
    }

    let partitions = split_partitions(documents, config.partitions)?;
    let per_partition = partitions.first().map(Vec::len).unwrap_or(0);
    info!(
        root = %config.root.display(),
        found,
        partitions = partitions.len(),
        per_partition,
        "partitioned corpus"
    );

    Ok(partitions)
}

/// Summarize the partitioning `config` would produce without running it.
pub fn summarize(config: &CorpusConfig) -> Result<PartitionSummary> {
    let documents = list_documents(config)?;
    let found = documents.len();
    let partitions = partition_documents(documents, config)?;

    let partition_size = partitions.first().map(Vec::len).unwrap_or(0);
    let used = partition_size * partitions.len();

    Ok(PartitionSummary {
        partitions: partitions.len(),
        partition_size,
        documents_found: found,
        documents_used: used,
        documents_dropped: found - used,
        first_ids: partitions
            .iter()
            .filter_map(|p| p.first().map(|d| d.id.clone()))
            .collect(),
    })
}

/// List the regular files directly under the corpus root, sorted by path.
///
/// Entries that cannot be read, such as dangling symlinks, are skipped.
/// The glob is matched against the file name.
pub fn list_documents(config: &CorpusConfig) -> Result<Vec<DocumentRef>> {
    let root = &config.root;
    if !root.exists() {
        return Err(BenchError::CorpusNotFound(root.clone()));
    }
    if !root.is_dir() {
        return Err(BenchError::CorpusNotADirectory(root.clone()));
    }

    let include = build_globset(config.glob.as_deref())?;

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(true)
        .max_depth(Some(1))
        .build();

    let mut documents = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.depth().is_some_and(|depth| depth > 0) => {
                debug!(error = %err, "skipping unreadable corpus entry");
                continue;
            }
            Err(err) => {
                let source = err
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("failed to walk corpus directory"));
                return Err(BenchError::io(root, source));
            }
        };

        if !entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            continue;
        }

        let path = entry.path();
        if let Some(set) = &include {
            if !set.is_match(entry.file_name()) {
                continue;
            }
        }

        match DocumentRef::from_path(path) {
            Some(doc) => documents.push(doc),
            None => debug!(path = %path.display(), "skipping file without a document id"),
        }
    }

    if documents.is_empty() {
        return Err(BenchError::EmptyCorpus(root.clone()));
    }

    documents.sort_by(|a, b| a.path.cmp(&b.path));
    ensure_unique_ids(&documents)?;

    Ok(documents)
}

/// Shuffle in place with a generator seeded from `seed`.
pub fn shuffle_documents<T>(documents: &mut [T], seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    documents.shuffle(&mut rng);
}

/// Split `items` into exactly `n_partitions` contiguous chunks of
/// `items.len() / n_partitions` elements; the remainder is dropped.
pub fn split_partitions<T>(items: Vec<T>, n_partitions: usize) -> Result<Vec<Vec<T>>> {
    if n_partitions == 0 {
        return Err(BenchError::NoPartitions);
    }

    let per_partition = items.len() / n_partitions;
    if per_partition == 0 {
        return Err(BenchError::CorpusTooSmall {
            found: items.len(),
            partitions: n_partitions,
        });
    }

    let mut items = items;
    items.truncate(per_partition * n_partitions);

    let mut partitions = Vec::with_capacity(n_partitions);
    let mut rest = items.into_iter();
    for _ in 0..n_partitions {
        partitions.push(rest.by_ref().take(per_partition).collect());
    }

    Ok(partitions)
}

fn ensure_unique_ids(documents: &[DocumentRef]) -> Result<()> {
    let mut seen: HashMap<&str, &DocumentRef> = HashMap::with_capacity(documents.len());
    for doc in documents {
        if let Some(first) = seen.insert(doc.id.as_str(), doc) {
            return Err(BenchError::DuplicateDocument {
                id: doc.id.clone(),
                first: first.path.clone(),
                second: doc.path.clone(),
            });
        }
    }
    Ok(())
}

fn build_globset(pattern: Option<&str>) -> Result<Option<GlobSet>> {
    let Some(pattern) = pattern else {
        return Ok(None);
    };

    let mut builder = GlobSetBuilder::new();
    builder.add(Glob::new(pattern)?);
    Ok(Some(builder.build()?))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::*;

    fn write_corpus(dir: &Path, n: usize) {
        for i in 1..=n {
            fs::write(dir.join(format!("{i}.txt")), format!("book number {i}"))
                .expect("write book");
        }
    }

    fn config_for(dir: &Path) -> CorpusConfig {
        CorpusConfig::new(dir)
    }

    #[test]
    fn partitions_are_deterministic_for_fixed_seed() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_corpus(dir.path(), 97);
        let config = config_for(dir.path());

        let first = get_partitions(&config).expect("partitions");
        let second = get_partitions(&config).expect("partitions");
        assert_eq!(first, second);
    }

    #[test]
    fn different_seeds_change_the_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_corpus(dir.path(), 200);

        let a = get_partitions(&config_for(dir.path())).expect("partitions");
        let mut other = config_for(dir.path());
        other.seed = 7;
        let b = get_partitions(&other).expect("partitions");

        assert_ne!(a, b);
    }

    #[test]
    fn partitions_are_equal_and_shortfall_is_below_partition_count() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_corpus(dir.path(), 219);

        let partitions = get_partitions(&config_for(dir.path())).expect("partitions");
        assert_eq!(partitions.len(), 20);
        assert!(partitions.iter().all(|p| p.len() == 10));

        let total: usize = partitions.iter().map(Vec::len).sum();
        assert!(total <= 219);
        assert!(219 - total < 20);
    }

    #[test]
    fn partitions_are_disjoint() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_corpus(dir.path(), 200);

        let partitions = get_partitions(&config_for(dir.path())).expect("partitions");
        let mut ids: Vec<&str> = partitions
            .iter()
            .flat_map(|p| p.iter().map(|d| d.id.as_str()))
            .collect();
        let before = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), before);
    }

    #[test]
    fn two_hundred_documents_give_ten_per_partition() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_corpus(dir.path(), 200);

        let partitions = get_partitions(&config_for(dir.path())).expect("partitions");
        assert_eq!(partitions.len(), 20);
        assert!(partitions.iter().all(|p| p.len() == 10));
    }

    #[test]
    fn cap_truncates_before_partitioning() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_corpus(dir.path(), 300);

        let mut config = config_for(dir.path());
        config.max_documents = Some(45);
        let capped = get_partitions(&config).expect("partitions");
        assert!(capped.iter().all(|p| p.len() == 2));

        // The cap keeps a prefix of the same shuffle.
        config.max_documents = None;
        let full = get_partitions(&config).expect("partitions");
        let capped_flat: Vec<_> = capped.into_iter().flatten().collect();
        let full_flat: Vec<_> = full.into_iter().flatten().collect();
        assert_eq!(capped_flat[..], full_flat[..40]);
    }

    #[test]
    fn missing_corpus_directory_is_a_filesystem_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = get_partitions(&config_for(&dir.path().join("missing"))).unwrap_err();
        assert!(matches!(err, BenchError::CorpusNotFound(_)));
        assert!(err.is_filesystem());
    }

    #[test]
    fn empty_corpus_directory_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("nested")).expect("mkdir");

        let err = list_documents(&config_for(dir.path())).unwrap_err();
        assert!(matches!(err, BenchError::EmptyCorpus(_)));
    }

    #[test]
    fn corpus_smaller_than_partition_count_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_corpus(dir.path(), 5);

        let err = get_partitions(&config_for(dir.path())).unwrap_err();
        assert!(matches!(
            err,
            BenchError::CorpusTooSmall {
                found: 5,
                partitions: 20
            }
        ));
    }

    #[test]
    fn nested_directories_are_not_walked() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_corpus(dir.path(), 3);
        let nested = dir.path().join("more");
        fs::create_dir(&nested).expect("mkdir");
        fs::write(nested.join("99.txt"), "nested").expect("write");

        let docs = list_documents(&config_for(dir.path())).expect("docs");
        assert_eq!(docs.len(), 3);
        assert!(docs.iter().all(|d| d.id != "99"));
    }

    #[test]
    fn glob_filters_candidate_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_corpus(dir.path(), 4);
        fs::write(dir.path().join("notes.md"), "not a book").expect("write");

        let mut config = config_for(dir.path());
        config.glob = Some("*.txt".to_string());
        let docs = list_documents(&config).expect("docs");
        assert_eq!(docs.len(), 4);
    }

    #[test]
    fn glob_is_matched_against_file_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        for i in 10..=40 {
            fs::write(dir.path().join(format!("{i}.txt")), "book").expect("write");
        }

        let mut config = config_for(dir.path());
        config.glob = Some("1*.txt".to_string());
        let docs = list_documents(&config).expect("docs");

        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        let expected: Vec<String> = (10..=19).map(|i| i.to_string()).collect();
        assert_eq!(ids, expected);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlinks_are_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_corpus(dir.path(), 40);
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("99.txt"))
            .expect("symlink");

        let docs = list_documents(&config_for(dir.path())).expect("docs");
        assert_eq!(docs.len(), 40);
        assert!(docs.iter().all(|d| d.id != "99"));

        let partitions = get_partitions(&config_for(dir.path())).expect("partitions");
        assert!(partitions.iter().all(|p| p.len() == 2));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("12.txt"), "a").expect("write");
        fs::write(dir.path().join("12.html"), "b").expect("write");

        let err = list_documents(&config_for(dir.path())).unwrap_err();
        assert!(matches!(err, BenchError::DuplicateDocument { ref id, .. } if id == "12"));
    }

    #[test]
    fn split_drops_the_remainder() {
        let parts = split_partitions((0..23).collect::<Vec<_>>(), 4).expect("split");
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], vec![0, 1, 2, 3, 4]);
        assert_eq!(parts[3], vec![15, 16, 17, 18, 19]);
    }

    #[test]
    fn summary_reports_dropped_documents() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_corpus(dir.path(), 205);

        let summary = summarize(&config_for(dir.path())).expect("summary");
        assert_eq!(summary.partitions, 20);
        assert_eq!(summary.partition_size, 10);
        assert_eq!(summary.documents_found, 205);
        assert_eq!(summary.documents_used, 200);
        assert_eq!(summary.documents_dropped, 5);
        assert_eq!(summary.first_ids.len(), 20);
    }
}
