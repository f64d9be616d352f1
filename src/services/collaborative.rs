//! User-based collaborative filtering.
//!
//! Ratings are pivoted into a dense user x movie matrix (0 = unrated), the
//! target user's nearest neighbours are found by exhaustive Euclidean search,
//! and the neighbours' ratings of movies the target has not rated are
//! averaged into an estimated rating.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use ndarray::Array2;

use crate::models::{PredictedMovie, RatingRecord, UserRating};
use crate::services::recommendations::RecommendationError;

/// Upper bound on the neighbourhood size
pub const MAX_NEIGHBORS: usize = 10;

/// Maximum number of predicted movies returned for a user
pub const PREDICTED_MOVIES_LIMIT: usize = 20;

/// Neighbourhood size for a matrix with `user_count` rows: `min(10, U / 2)`
pub fn neighbor_count(user_count: usize) -> usize {
    (user_count / 2).min(MAX_NEIGHBORS)
}

/// Dense user-item rating matrix
///
/// Rows are the distinct users that rated anything and columns the distinct
/// movies rated by anyone, both in ascending id order. If the same pair was
/// rated more than once the cell holds the mean of those ratings.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingMatrix {
    users: Vec<i32>,
    movies: Vec<i32>,
    values: Array2<f64>,
}

impl RatingMatrix {
    pub fn from_ratings(ratings: &[RatingRecord]) -> Self {
        let users: Vec<i32> = ratings
            .iter()
            .map(|r| r.user_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let movies: Vec<i32> = ratings
            .iter()
            .map(|r| r.movie_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let user_index: HashMap<i32, usize> =
            users.iter().enumerate().map(|(i, id)| (*id, i)).collect();
        let movie_index: HashMap<i32, usize> =
            movies.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        let shape = (users.len(), movies.len());
        let mut sums = Array2::<f64>::zeros(shape);
        let mut counts = Array2::<f64>::zeros(shape);
        for rating in ratings {
            let cell = [user_index[&rating.user_id], movie_index[&rating.movie_id]];
            sums[cell] += f64::from(rating.rating);
            counts[cell] += 1.0;
        }

        let mut values = sums;
        values.zip_mut_with(&counts, |sum, &n| {
            if n > 0.0 {
                *sum /= n;
            }
        });

        Self {
            users,
            movies,
            values,
        }
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn user_row(&self, user_id: i32) -> Option<usize> {
        self.users.binary_search(&user_id).ok()
    }

    pub fn user_id(&self, row: usize) -> i32 {
        self.users[row]
    }

    pub fn value(&self, user_id: i32, movie_id: i32) -> Option<f64> {
        let row = self.user_row(user_id)?;
        let col = self.movies.binary_search(&movie_id).ok()?;
        Some(self.values[[row, col]])
    }

    fn distance(&self, a: usize, b: usize) -> f64 {
        let diff = &self.values.row(a) - &self.values.row(b);
        diff.dot(&diff).sqrt()
    }

    /// Rows of the `k` users closest to `row` by Euclidean distance
    ///
    /// Brute-force scan over every other row; the query row itself is not a
    /// candidate. Equal distances keep row order.
    pub fn nearest_neighbors(&self, row: usize, k: usize) -> Vec<usize> {
        let mut candidates: Vec<(usize, f64)> = (0..self.users.len())
            .filter(|&other| other != row)
            .map(|other| (other, self.distance(row, other)))
            .collect();
        candidates.sort_by(|a, b| a.1.total_cmp(&b.1));
        candidates.into_iter().take(k).map(|(other, _)| other).collect()
    }
}

/// Predicts ratings for movies `user_id` has not rated yet
///
/// `all_ratings` is the full ratings relation; `user_ratings` the ratings of
/// the target user, used to exclude movies already seen.
pub fn predicted_movies(
    all_ratings: &[RatingRecord],
    user_ratings: &[UserRating],
    user_id: i32,
) -> Result<Vec<PredictedMovie>, RecommendationError> {
    if all_ratings.is_empty() {
        return Err(RecommendationError::NoRatingsData);
    }

    let matrix = RatingMatrix::from_ratings(all_ratings);
    let row = matrix
        .user_row(user_id)
        .ok_or(RecommendationError::UserHasNoRatings(user_id))?;

    let (user_count, movie_count) = matrix.shape();
    let k = neighbor_count(user_count);
    let neighbors: HashSet<i32> = matrix
        .nearest_neighbors(row, k)
        .into_iter()
        .map(|r| matrix.user_id(r))
        .collect();

    tracing::debug!(
        user_id,
        users = user_count,
        movies = movie_count,
        k,
        neighbors = ?neighbors,
        "Computed rating neighbourhood"
    );

    let seen: HashSet<i32> = user_ratings.iter().map(|r| r.movie_id).collect();

    // movie id -> (rating sum, rating count, title, release year)
    let mut groups: BTreeMap<i32, (f64, u32, &str, i32)> = BTreeMap::new();
    for rating in all_ratings
        .iter()
        .filter(|r| neighbors.contains(&r.user_id))
        .filter(|r| !seen.contains(&r.movie_id))
    {
        let entry = groups.entry(rating.movie_id).or_insert((
            0.0,
            0,
            rating.movie_title.as_str(),
            rating.movie_release_year,
        ));
        entry.0 += f64::from(rating.rating);
        entry.1 += 1;
    }

    let mut predictions: Vec<PredictedMovie> = groups
        .into_iter()
        .map(|(movie_id, (sum, n, title, release_year))| PredictedMovie {
            id: movie_id,
            title: title.to_string(),
            release_year,
            estimated_rating: sum / f64::from(n),
        })
        .collect();

    // stable: equal estimates keep ascending movie id order
    predictions.sort_by(|a, b| b.estimated_rating.total_cmp(&a.estimated_rating));
    predictions.truncate(PREDICTED_MOVIES_LIMIT);

    if predictions.is_empty() {
        return Err(RecommendationError::NoCandidates);
    }

    Ok(predictions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(user_id: i32, movie_id: i32, rating: i32) -> RatingRecord {
        RatingRecord {
            user_id,
            movie_id,
            movie_title: format!("Movie {}", movie_id),
            movie_release_year: 2000 + movie_id,
            rating,
        }
    }

    fn own_ratings(all: &[RatingRecord], user_id: i32) -> Vec<UserRating> {
        all.iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| UserRating {
                user_id: r.user_id,
                movie_id: r.movie_id,
                rating: r.rating,
            })
            .collect()
    }

    fn predict(
        all: &[RatingRecord],
        user_id: i32,
    ) -> Result<Vec<PredictedMovie>, RecommendationError> {
        predicted_movies(all, &own_ratings(all, user_id), user_id)
    }

    #[test]
    fn test_neighbor_count_formula() {
        assert_eq!(neighbor_count(1), 0);
        assert_eq!(neighbor_count(2), 1);
        assert_eq!(neighbor_count(3), 1);
        assert_eq!(neighbor_count(20), 10);
        assert_eq!(neighbor_count(500), 10);
    }

    #[test]
    fn test_matrix_shape_and_zero_fill() {
        let ratings = vec![record(1, 10, 4), record(2, 20, 3), record(2, 30, 5)];
        let matrix = RatingMatrix::from_ratings(&ratings);
        assert_eq!(matrix.shape(), (2, 3));
        assert_eq!(matrix.value(1, 10), Some(4.0));
        assert_eq!(matrix.value(1, 20), Some(0.0));
        assert_eq!(matrix.value(3, 10), None);
    }

    #[test]
    fn test_distance_is_euclidean() {
        let ratings = vec![record(1, 10, 4), record(2, 20, 3)];
        let matrix = RatingMatrix::from_ratings(&ratings);
        assert_eq!(matrix.distance(0, 1), 5.0);
        assert_eq!(matrix.distance(1, 1), 0.0);
    }

    #[test]
    fn test_matrix_averages_duplicate_pairs() {
        let ratings = vec![record(1, 10, 2), record(1, 10, 5)];
        let matrix = RatingMatrix::from_ratings(&ratings);
        assert_eq!(matrix.shape(), (1, 1));
        assert_eq!(matrix.value(1, 10), Some(3.5));
    }

    #[test]
    fn test_nearest_neighbors_excludes_query_row() {
        let ratings = vec![
            record(1, 1, 5),
            record(2, 1, 5),
            record(3, 1, 1),
            record(4, 1, 4),
        ];
        let matrix = RatingMatrix::from_ratings(&ratings);
        let row = matrix.user_row(1).unwrap();
        let neighbors: Vec<i32> = matrix
            .nearest_neighbors(row, 2)
            .into_iter()
            .map(|r| matrix.user_id(r))
            .collect();
        assert_eq!(neighbors, vec![2, 4]);
    }

    #[test]
    fn test_nearest_neighbour_rating_is_surfaced() {
        let ratings = vec![
            record(1, 1, 5),
            record(1, 2, 1),
            record(2, 1, 5),
            record(2, 2, 1),
            record(2, 3, 4),
        ];
        let result = predict(&ratings, 1).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 3);
        assert_eq!(result[0].estimated_rating, 4.0);
        assert_eq!(result[0].title, "Movie 3");
        assert_eq!(result[0].release_year, 2003);
    }

    #[test]
    fn test_estimate_is_mean_over_neighbours() {
        // user 1 rated movie 1; users 2..=5 are the neighbourhood (k = min(10, 5 / 2) = 2)
        let ratings = vec![
            record(1, 1, 5),
            record(2, 1, 5),
            record(2, 9, 4),
            record(3, 1, 5),
            record(3, 9, 1),
            record(4, 1, 1),
            record(4, 8, 5),
            record(5, 1, 1),
            record(5, 8, 5),
        ];
        let result = predict(&ratings, 1).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, 9);
        assert_eq!(result[0].estimated_rating, 2.5);
    }

    #[test]
    fn test_never_returns_rated_movies() {
        let mut ratings = Vec::new();
        for user in 1..=12 {
            for movie in 1..=15 {
                if (user + movie) % 3 != 0 {
                    ratings.push(record(user, movie, (user * movie) % 5 + 1));
                }
            }
        }
        let seen: HashSet<i32> = own_ratings(&ratings, 4).iter().map(|r| r.movie_id).collect();
        let result = predict(&ratings, 4).unwrap();
        assert!(!result.is_empty());
        assert!(result.iter().all(|m| !seen.contains(&m.id)));
        assert!(result.len() <= PREDICTED_MOVIES_LIMIT);
        assert!(result
            .windows(2)
            .all(|pair| pair[0].estimated_rating >= pair[1].estimated_rating));
    }

    #[test]
    fn test_result_is_capped() {
        let mut ratings = vec![record(1, 1, 3)];
        for movie in 2..=40 {
            ratings.push(record(2, movie, movie % 5 + 1));
        }
        ratings.push(record(2, 1, 3));
        let result = predict(&ratings, 1).unwrap();
        assert_eq!(result.len(), PREDICTED_MOVIES_LIMIT);
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let ratings = vec![
            record(1, 1, 4),
            record(2, 1, 4),
            record(2, 2, 3),
            record(3, 3, 2),
        ];
        assert_eq!(predict(&ratings, 1).unwrap(), predict(&ratings, 1).unwrap());
    }

    #[test]
    fn test_empty_ratings() {
        assert_eq!(predict(&[], 1).unwrap_err(), RecommendationError::NoRatingsData);
    }

    #[test]
    fn test_user_without_ratings() {
        let ratings = vec![record(1, 1, 4), record(2, 2, 3)];
        assert_eq!(
            predict(&ratings, 99).unwrap_err(),
            RecommendationError::UserHasNoRatings(99)
        );
    }

    #[test]
    fn test_single_user_has_no_candidates() {
        let ratings = vec![record(1, 1, 4), record(1, 2, 3)];
        assert_eq!(predict(&ratings, 1).unwrap_err(), RecommendationError::NoCandidates);
    }

    #[test]
    fn test_neighbour_with_same_movies_has_no_candidates() {
        let ratings = vec![record(1, 1, 4), record(2, 1, 2)];
        assert_eq!(predict(&ratings, 1).unwrap_err(), RecommendationError::NoCandidates);
    }
}
