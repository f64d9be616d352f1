//! Content-based similarity between catalog movies.
//!
//! Each movie is reduced to a feature document made of its cast, directors
//! and genres. Documents are turned into bag-of-words count vectors and
//! compared with cosine similarity. Everything is rebuilt per call, so the
//! cost is O(N * V) in catalog size and vocabulary size for every request.

use std::collections::BTreeMap;

use ndarray::{Array2, ArrayView1};

use crate::models::{CatalogMovie, RecommendedMovie};
use crate::services::recommendations::RecommendationError;
use crate::services::stop_words::is_stop_word;

/// Maximum number of similar movies returned for a target
pub const SIMILAR_MOVIES_LIMIT: usize = 10;

/// Builds the `"<actors> <directors> <genres>"` document for one movie
///
/// Person names are written without a space between first and last name so a
/// full name becomes a single token; multi-word genres lose their spaces for
/// the same reason.
pub fn feature_document(movie: &CatalogMovie) -> String {
    let actors = movie
        .actors
        .iter()
        .map(|a| a.joined_name())
        .collect::<Vec<_>>()
        .join(", ");
    let directors = movie
        .directors
        .iter()
        .map(|d| d.joined_name())
        .collect::<Vec<_>>()
        .join(", ");
    let genres = movie
        .genres
        .iter()
        .map(|g| g.name.split_whitespace().collect::<String>())
        .collect::<Vec<_>>()
        .join(", ");

    format!("{} {} {}", actors, directors, genres)
}

/// Splits a document into lowercase word tokens of at least two characters,
/// dropping English stop words
pub fn tokenize(document: &str) -> Vec<String> {
    document
        .to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .filter(|token| !is_stop_word(token))
        .map(str::to_string)
        .collect()
}

/// Bag-of-words vectorizer with a vocabulary learned from the fitted documents
#[derive(Debug, Clone, Default)]
pub struct CountVectorizer {
    vocabulary: BTreeMap<String, usize>,
}

impl CountVectorizer {
    /// Learns the vocabulary from `documents` and returns the document-term
    /// count matrix, one row per document and one column per term
    pub fn fit_transform(documents: &[String]) -> (Self, Array2<f64>) {
        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d)).collect();

        let mut terms: Vec<&String> = tokenized.iter().flatten().collect();
        terms.sort();
        terms.dedup();
        let vocabulary: BTreeMap<String, usize> = terms
            .into_iter()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx))
            .collect();

        let mut counts = Array2::zeros((documents.len(), vocabulary.len()));
        for (row, tokens) in tokenized.iter().enumerate() {
            for token in tokens {
                if let Some(&col) = vocabulary.get(token) {
                    counts[[row, col]] += 1.0;
                }
            }
        }

        (Self { vocabulary }, counts)
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }
}

/// Cosine similarity of two count vectors; 0.0 when either vector is all zeros
pub fn cosine_similarity(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    a.dot(&b) / (norm_a * norm_b)
}

/// Ranks the catalog by similarity to `movie_id`
///
/// The target itself is never part of the result. Ties keep catalog order.
pub fn similar_movies(
    catalog: &[CatalogMovie],
    movie_id: i32,
) -> Result<Vec<RecommendedMovie>, RecommendationError> {
    let target = catalog
        .iter()
        .position(|movie| movie.id == movie_id)
        .ok_or(RecommendationError::TargetNotFound(movie_id))?;

    let documents: Vec<String> = catalog.iter().map(feature_document).collect();
    let (vectorizer, counts) = CountVectorizer::fit_transform(&documents);

    tracing::debug!(
        movie_id,
        catalog_size = catalog.len(),
        vocabulary = vectorizer.vocabulary_len(),
        "Vectorized catalog"
    );

    let target_row = counts.row(target);
    let mut scores: Vec<(usize, f64)> = counts
        .outer_iter()
        .enumerate()
        .filter(|(idx, _)| *idx != target)
        .map(|(idx, row)| (idx, cosine_similarity(target_row, row)))
        .collect();

    // stable: equal scores keep catalog order
    scores.sort_by(|a, b| b.1.total_cmp(&a.1));

    Ok(scores
        .into_iter()
        .take(SIMILAR_MOVIES_LIMIT)
        .map(|(idx, similarity)| {
            let movie = &catalog[idx];
            RecommendedMovie {
                id: movie.id,
                title: movie.title.clone(),
                release_year: movie.release_year,
                similarity,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActorCredit, Genre, PersonRef};
    use ndarray::array;

    fn actor(id: i32, first: &str, last: &str) -> ActorCredit {
        ActorCredit {
            id,
            first_name: first.to_string(),
            last_name: Some(last.to_string()),
            character: None,
        }
    }

    fn director(id: i32, first: &str, last: &str) -> PersonRef {
        PersonRef {
            id,
            first_name: first.to_string(),
            last_name: Some(last.to_string()),
        }
    }

    fn genre(id: i32, name: &str) -> Genre {
        Genre {
            id,
            name: name.to_string(),
        }
    }

    fn movie(
        id: i32,
        actors: Vec<ActorCredit>,
        directors: Vec<PersonRef>,
        genres: Vec<Genre>,
    ) -> CatalogMovie {
        CatalogMovie {
            id,
            title: format!("Movie {}", id),
            release_year: 1990 + id,
            actors,
            directors,
            genres,
        }
    }

    fn filler_catalog(size: i32) -> Vec<CatalogMovie> {
        (1..=size)
            .map(|id| {
                movie(
                    id,
                    vec![actor(id, "Actor", &format!("Number{}", id))],
                    vec![director(100 + id, "Director", &format!("Number{}", id % 3))],
                    vec![genre(1, "Drama")],
                )
            })
            .collect()
    }

    #[test]
    fn test_feature_document_layout() {
        let m = movie(
            1,
            vec![actor(1, "Tom", "Hanks"), actor(2, "Robin", "Wright")],
            vec![director(3, "Robert", "Zemeckis")],
            vec![genre(1, "Drama"), genre(2, "Science Fiction")],
        );
        assert_eq!(
            feature_document(&m),
            "TomHanks, RobinWright RobertZemeckis Drama, ScienceFiction"
        );
    }

    #[test]
    fn test_tokenize_lowercases_and_drops_stop_words() {
        let tokens = tokenize("TomHanks, The X Drama");
        assert_eq!(tokens, vec!["tomhanks", "drama"]);
    }

    #[test]
    fn test_count_vectors_count_repeats() {
        let docs = vec!["drama drama comedy".to_string(), "comedy".to_string()];
        let (vectorizer, counts) = CountVectorizer::fit_transform(&docs);
        assert_eq!(vectorizer.vocabulary_len(), 2);
        // vocabulary is sorted: comedy=0, drama=1
        assert_eq!(counts, array![[1.0, 2.0], [1.0, 0.0]]);
    }

    #[test]
    fn test_cosine_similarity_of_empty_vector_is_zero() {
        let docs = vec!["the of and".to_string(), "drama".to_string()];
        let (_, counts) = CountVectorizer::fit_transform(&docs);
        assert!(counts.row(0).iter().all(|&c| c == 0.0));
        assert_eq!(cosine_similarity(counts.row(0), counts.row(1)), 0.0);
    }

    #[test]
    fn test_identical_documents_are_fully_similar() {
        let docs = vec!["tomhanks drama".to_string(), "tomhanks drama".to_string()];
        let (_, counts) = CountVectorizer::fit_transform(&docs);
        assert!((cosine_similarity(counts.row(0), counts.row(1)) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_shared_cast_ranks_above_disjoint_cast() {
        let shared_actors = vec![actor(1, "Keanu", "Reeves"), actor(2, "Carrie", "Moss")];
        let shared_directors = vec![director(3, "Lana", "Wachowski")];
        let catalog = vec![
            movie(1, shared_actors.clone(), shared_directors.clone(), vec![genre(1, "Action")]),
            movie(2, shared_actors, shared_directors, vec![genre(1, "Action")]),
            movie(
                3,
                vec![actor(4, "Meryl", "Streep")],
                vec![director(5, "Nora", "Ephron")],
                vec![genre(2, "Romance")],
            ),
        ];

        let result = similar_movies(&catalog, 1).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].id, 2);
        assert_eq!(result[1].id, 3);
        assert!(result[0].similarity > result[1].similarity);
    }

    #[test]
    fn test_target_is_never_returned() {
        let catalog = filler_catalog(15);
        for target in [1, 7, 15] {
            let result = similar_movies(&catalog, target).unwrap();
            assert!(result.iter().all(|m| m.id != target));
        }
    }

    #[test]
    fn test_result_size_is_bounded() {
        assert_eq!(similar_movies(&filler_catalog(15), 1).unwrap().len(), 10);
        assert_eq!(similar_movies(&filler_catalog(11), 1).unwrap().len(), 10);
        assert_eq!(similar_movies(&filler_catalog(4), 1).unwrap().len(), 3);
        assert!(similar_movies(&filler_catalog(1), 1).unwrap().is_empty());
    }

    #[test]
    fn test_scores_are_non_increasing() {
        let result = similar_movies(&filler_catalog(20), 4).unwrap();
        assert!(result
            .windows(2)
            .all(|pair| pair[0].similarity >= pair[1].similarity));
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let result = similar_movies(&filler_catalog(8), 1).unwrap();
        // movies 4 and 7 share director Number1 with movie 1; the rest only share the genre
        let ids: Vec<i32> = result.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![4, 7, 2, 3, 5, 6, 8]);
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let catalog = filler_catalog(12);
        assert_eq!(
            similar_movies(&catalog, 5).unwrap(),
            similar_movies(&catalog, 5).unwrap()
        );
    }

    #[test]
    fn test_unknown_target_is_not_found() {
        let err = similar_movies(&filler_catalog(3), 42).unwrap_err();
        assert_eq!(err, RecommendationError::TargetNotFound(42));
    }
}
