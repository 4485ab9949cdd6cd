//! Record shapes returned by the relational backends.
//!
//! Point reads serialize one of the `*Detail` trees to JSON. The nested
//! summaries mirror the shapes the object-database backend produces
//! natively, so every backend hands the driver the same document layout.

use serde::{Deserialize, Serialize};

/// Full user page: profile plus the ten newest reviews.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDetail {
    pub id: String,
    pub name: String,
    pub image: String,
    pub latest_reviews: Vec<UserReview>,
}

/// Review as shown on the user page, with the reviewed movie inlined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserReview {
    pub id: String,
    pub body: String,
    pub rating: i32,
    pub movie: MovieSummary,
}

/// Movie as referenced from a review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: String,
    pub image: String,
    pub title: String,
    pub avg_rating: Option<f64>,
}

/// Full movie page: attributes, credits in billing order, all reviews.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieDetail {
    pub id: String,
    pub image: String,
    pub title: String,
    pub year: i32,
    pub description: String,
    pub avg_rating: Option<f64>,
    pub directors: Vec<MovieCredit>,
    pub cast: Vec<MovieCredit>,
    pub reviews: Vec<MovieReview>,
}

/// Person credit on the movie page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieCredit {
    pub id: String,
    pub full_name: String,
    pub image: String,
}

/// Review as shown on the movie page, with its author inlined.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieReview {
    pub id: String,
    pub body: String,
    pub rating: i32,
    pub author: UserSummary,
}

/// User as referenced from a review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub image: String,
}

/// Full person page: profile plus acting and directing filmographies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonDetail {
    pub id: String,
    pub full_name: String,
    pub image: String,
    pub bio: String,
    pub acted_in: Vec<CreditedMovie>,
    pub directed: Vec<CreditedMovie>,
}

/// Movie entry in a filmography.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditedMovie {
    pub id: String,
    pub image: String,
    pub title: String,
    pub year: i32,
    pub avg_rating: Option<f64>,
}

/// Result of a title update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatedMovie {
    pub id: String,
    pub title: String,
}

/// Result of a user insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertedUser {
    pub id: String,
    pub name: String,
    pub image: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_detail_serializes_null_avg_rating() {
        let movie = MovieDetail {
            id: "m1".to_string(),
            image: "img_m1".to_string(),
            title: "Quiet Harbor".to_string(),
            year: 2004,
            description: "desc".to_string(),
            avg_rating: None,
            directors: Vec::new(),
            cast: Vec::new(),
            reviews: Vec::new(),
        };
        let json = serde_json::to_value(&movie).unwrap();
        assert!(json.get("avg_rating").unwrap().is_null());
        assert!(json.get("reviews").unwrap().as_array().unwrap().is_empty());
    }

    #[test]
    fn test_user_detail_round_trips_nested_reviews() {
        let user = UserDetail {
            id: "u1".to_string(),
            name: "Alice".to_string(),
            image: "img_u1".to_string(),
            latest_reviews: vec![UserReview {
                id: "r1".to_string(),
                body: "great".to_string(),
                rating: 5,
                movie: MovieSummary {
                    id: "m1".to_string(),
                    image: "img_m1".to_string(),
                    title: "Quiet Harbor".to_string(),
                    avg_rating: Some(4.5),
                },
            }],
        };
        let encoded = serde_json::to_string(&user).unwrap();
        let decoded: UserDetail = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.latest_reviews.len(), 1);
        assert_eq!(decoded.latest_reviews[0].movie.title, "Quiet Harbor");
    }
}
