use serde::{Deserialize, Deserializer, Serialize};

/// Explicit `null` on the wire decodes like an absent key.
fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Option::unwrap_or_default)
}

/// Wire envelope: every body, success or failure, is wrapped in `{"response": ...}`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SearchResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub response: ResultPage,
}

/// One page of results plus quota and cursor metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ResultPage {
    #[serde(deserialize_with = "null_as_default")]
    pub data: Vec<Post>,
    #[serde(rename = "requestLeft", deserialize_with = "null_as_default")]
    pub request_left: i64,
    #[serde(rename = "totalResults", deserialize_with = "null_as_default")]
    pub total_results: i64,
    #[serde(rename = "restResults", deserialize_with = "null_as_default")]
    pub rest_results: i64,
    /// Opaque continuation URL; empty when this is the last page.
    #[serde(deserialize_with = "null_as_default")]
    pub next: String,
}

impl ResultPage {
    pub fn has_next(&self) -> bool {
        !self.next.is_empty()
    }

    /// The continuation URL, or `None` on the last page.
    pub fn next_url(&self) -> Option<&str> {
        self.has_next().then_some(self.next.as_str())
    }
}

/// Body shape returned alongside non-200 statuses.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServiceError {
    #[serde(deserialize_with = "null_as_default")]
    pub response: ServiceErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServiceErrorDetail {
    #[serde(deserialize_with = "null_as_default")]
    pub error: String,
}

impl ServiceError {
    /// Service-provided error text, if `body` carries one.
    pub fn message_from(body: &[u8]) -> Option<String> {
        serde_json::from_slice::<ServiceError>(body)
            .ok()
            .map(|e| e.response.error)
            .filter(|m| !m.is_empty())
    }
}

/// A single archived post. Absent wire fields decode to zero / empty / false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Post {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub hash: String,
    #[serde(deserialize_with = "null_as_default")]
    pub published: String,
    /// Ingestion time, epoch milliseconds.
    #[serde(deserialize_with = "null_as_default")]
    pub crawled: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub updated: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub post_id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
    #[serde(deserialize_with = "null_as_default")]
    pub lang: String,

    #[serde(deserialize_with = "null_as_default")]
    pub retweet_count: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub reply_count: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub favorite_count: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub reproductions_count: i64,

    #[serde(deserialize_with = "null_as_default")]
    pub entities_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub url_image: String,
    /// Delimited list as sent by the service.
    #[serde(deserialize_with = "null_as_default")]
    pub hashtags: String,
    #[serde(deserialize_with = "null_as_default")]
    pub user_mentions: String,

    #[serde(deserialize_with = "null_as_default")]
    pub time_distance: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub reply: bool,

    // Author attributes travel as flat `user_*` keys.
    #[serde(flatten)]
    pub author: Author,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Author {
    #[serde(rename = "user_name", deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(rename = "user_screen_name", deserialize_with = "null_as_default")]
    pub screen_name: String,
    #[serde(rename = "user_creation_date", deserialize_with = "null_as_default")]
    pub creation_date: String,
    #[serde(rename = "user_url", deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(rename = "user_profile_image_url", deserialize_with = "null_as_default")]
    pub profile_image_url: String,
    #[serde(rename = "user_profile_banner_url", deserialize_with = "null_as_default")]
    pub profile_banner_url: String,
    #[serde(rename = "user_description", deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(rename = "user_external_url", deserialize_with = "null_as_default")]
    pub external_url: String,
    #[serde(rename = "user_location", deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(rename = "user_follower_count", deserialize_with = "null_as_default")]
    pub follower_count: i64,
    #[serde(rename = "user_following_count", deserialize_with = "null_as_default")]
    pub following_count: i64,
    #[serde(rename = "user_favourites_count", deserialize_with = "null_as_default")]
    pub favourites_count: i64,
    #[serde(rename = "user_is_private", deserialize_with = "null_as_default")]
    pub is_private: bool,
    #[serde(rename = "user_is_verified", deserialize_with = "null_as_default")]
    pub is_verified: bool,
    #[serde(rename = "user_is_blue_verified", deserialize_with = "null_as_default")]
    pub is_blue_verified: bool,
    #[serde(rename = "user_number_of_tweets", deserialize_with = "null_as_default")]
    pub number_of_tweets: i64,
}
