//! Issue aggregate: a location-tagged civic report with photos, upvotes and
//! comments.
//!
//! The aggregate stores upvote membership as a set and derives the count from
//! it, so the count can never drift from the membership or go negative.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{FieldError, FieldErrors, UserId};

/// Maximum number of photos attached to one issue.
pub const MAX_IMAGES: usize = 5;
/// Maximum size of a single photo in bytes (5 MiB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;
/// Maximum title length in characters.
pub const TITLE_MAX: usize = 200;
/// Maximum description length in characters.
pub const DESCRIPTION_MAX: usize = 5000;
/// Maximum address length in characters.
pub const ADDRESS_MAX: usize = 500;
/// Maximum comment length in characters.
pub const COMMENT_MAX: usize = 2000;

/// Stable issue identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueId(Uuid);

impl IssueId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for IssueId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when parsing an unknown enum value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Kind of civic problem being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum IssueCategory {
    Pothole,
    Garbage,
    Streetlight,
    TrafficSignal,
    Parks,
    Sidewalk,
    Other,
}

impl IssueCategory {
    /// Every category, in display order.
    pub const ALL: [Self; 7] = [
        Self::Pothole,
        Self::Garbage,
        Self::Streetlight,
        Self::TrafficSignal,
        Self::Parks,
        Self::Sidewalk,
        Self::Other,
    ];

    /// Storage and wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pothole => "pothole",
            Self::Garbage => "garbage",
            Self::Streetlight => "streetlight",
            Self::TrafficSignal => "traffic-signal",
            Self::Parks => "parks",
            Self::Sidewalk => "sidewalk",
            Self::Other => "other",
        }
    }
}

impl FromStr for IssueCategory {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "category",
                value: s.to_owned(),
            })
    }
}

/// Triage state. Any status may follow any other.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "kebab-case")]
pub enum IssueStatus {
    #[default]
    Reported,
    Acknowledged,
    InProgress,
    Resolved,
}

impl IssueStatus {
    /// Every status, in workflow order.
    pub const ALL: [Self; 4] = [
        Self::Reported,
        Self::Acknowledged,
        Self::InProgress,
        Self::Resolved,
    ];

    /// Storage and wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reported => "reported",
            Self::Acknowledged => "acknowledged",
            Self::InProgress => "in-progress",
            Self::Resolved => "resolved",
        }
    }
}

impl FromStr for IssueStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "status",
                value: s.to_owned(),
            })
    }
}

/// Finite WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    latitude: f64,
    longitude: f64,
}

impl Coordinates {
    /// Validate latitude in `[-90, 90]` and longitude in `[-180, 180]`.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            errors.push(FieldError::new(
                "latitude",
                "out_of_range",
                "latitude must be a number between -90 and 90",
            ));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            errors.push(FieldError::new(
                "longitude",
                "out_of_range",
                "longitude must be a number between -180 and 180",
            ));
        }
        errors.finish(|| Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Street address plus coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    #[schema(example = "5th Ave & 23rd St")]
    pub address: String,
    pub coordinates: Coordinates,
}

/// Validated comment body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CommentText(String);

impl CommentText {
    /// Trim and validate comment text.
    pub fn new(text: impl AsRef<str>) -> Result<Self, FieldErrors> {
        let trimmed = text.as_ref().trim();
        if trimmed.is_empty() {
            return Err(FieldError::new("text", "empty", "comment text is required").into());
        }
        if trimmed.chars().count() > COMMENT_MAX {
            return Err(FieldError::new(
                "text",
                "too_long",
                format!("comment text must be at most {COMMENT_MAX} characters"),
            )
            .into());
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for CommentText {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Comment appended to an issue. Comments are immutable once written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    pub id: Uuid,
    pub author: UserId,
    pub text: CommentText,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    /// Build a new comment with a random identifier.
    pub fn new(author: UserId, text: CommentText, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author,
            text,
            created_at,
        }
    }
}

/// Photo received from a client, not yet stored on an asset host.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    file_name: Option<String>,
    content_type: String,
    bytes: Vec<u8>,
}

impl ImageUpload {
    /// Validate the MIME type and size of an uploaded photo.
    ///
    /// `index` is the zero-based position used in error details.
    pub fn new(
        index: usize,
        file_name: Option<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, FieldError> {
        let content_type = content_type.into();
        if !content_type.starts_with("image/") {
            return Err(FieldError::new(
                "images",
                "unsupported_type",
                format!("image {index} must be an image file, got '{content_type}'"),
            ));
        }
        if bytes.is_empty() {
            return Err(FieldError::new(
                "images",
                "empty_file",
                format!("image {index} is empty"),
            ));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(image_too_large(index));
        }
        Ok(Self {
            file_name,
            content_type,
            bytes,
        })
    }

    /// Original client-side file name, when provided.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Declared MIME type, always `image/*`.
    pub fn content_type(&self) -> &str {
        self.content_type.as_str()
    }

    /// Raw file content.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Field error for a photo exceeding [`MAX_IMAGE_BYTES`].
pub fn image_too_large(index: usize) -> FieldError {
    FieldError::new(
        "images",
        "too_large",
        format!("image {index} exceeds the {} MiB limit", MAX_IMAGE_BYTES / (1024 * 1024)),
    )
}

/// Field error for more than [`MAX_IMAGES`] photos.
pub fn too_many_images() -> FieldError {
    FieldError::new(
        "images",
        "too_many",
        format!("at most {MAX_IMAGES} images may be attached"),
    )
}

/// Raw issue submission fields as received from a client.
#[derive(Debug, Clone, Default)]
pub struct NewIssueParts<'a> {
    pub title: Option<&'a str>,
    pub description: Option<&'a str>,
    pub category: Option<&'a str>,
    pub address: Option<&'a str>,
    pub latitude: Option<&'a str>,
    pub longitude: Option<&'a str>,
}

/// Validated issue submission, ready for image upload and persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct NewIssue {
    title: String,
    description: String,
    category: IssueCategory,
    location: Location,
    images: Vec<ImageUpload>,
}

fn required_text(
    value: Option<&str>,
    field: &'static str,
    max: usize,
    errors: &mut FieldErrors,
) -> Option<String> {
    let trimmed = value.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        errors.push(FieldError::new(field, "required", format!("{field} is required")));
        return None;
    }
    if trimmed.chars().count() > max {
        errors.push(FieldError::new(
            field,
            "too_long",
            format!("{field} must be at most {max} characters"),
        ));
        return None;
    }
    Some(trimmed.to_owned())
}

fn coordinate(value: Option<&str>, field: &'static str, errors: &mut FieldErrors) -> Option<f64> {
    match value.map(str::trim).map(str::parse::<f64>) {
        Some(Ok(parsed)) if parsed.is_finite() => Some(parsed),
        _ => {
            errors.push(FieldError::new(
                field,
                "invalid_number",
                format!("valid {field} is required"),
            ));
            None
        }
    }
}

impl NewIssue {
    /// Validate every submission field and the attached photos, collecting all
    /// failures.
    pub fn try_from_parts(
        parts: NewIssueParts<'_>,
        images: Vec<ImageUpload>,
    ) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::default();
        let title = required_text(parts.title, "title", TITLE_MAX, &mut errors);
        let description =
            required_text(parts.description, "description", DESCRIPTION_MAX, &mut errors);
        let category = match parts.category.map(str::trim).map(IssueCategory::from_str) {
            Some(Ok(category)) => Some(category),
            _ => {
                errors.push(FieldError::new(
                    "category",
                    "invalid_choice",
                    "valid category is required",
                ));
                None
            }
        };
        let address = required_text(parts.address, "address", ADDRESS_MAX, &mut errors);
        let latitude = coordinate(parts.latitude, "latitude", &mut errors);
        let longitude = coordinate(parts.longitude, "longitude", &mut errors);
        let coordinates = match (latitude, longitude) {
            (Some(latitude), Some(longitude)) => match Coordinates::new(latitude, longitude) {
                Ok(coordinates) => Some(coordinates),
                Err(range_errors) => {
                    for error in range_errors.errors() {
                        errors.push(error.clone());
                    }
                    None
                }
            },
            _ => None,
        };
        if images.len() > MAX_IMAGES {
            errors.push(too_many_images());
        }

        match (title, description, category, address, coordinates) {
            (Some(title), Some(description), Some(category), Some(address), Some(coordinates))
                if errors.is_empty() =>
            {
                Ok(Self {
                    title,
                    description,
                    category,
                    location: Location {
                        address,
                        coordinates,
                    },
                    images,
                })
            }
            _ => Err(errors),
        }
    }

    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    pub fn category(&self) -> IssueCategory {
        self.category
    }

    pub fn images(&self) -> &[ImageUpload] {
        &self.images
    }
}

/// Outcome of an upvote toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpvoteChange {
    Added,
    Removed,
}

/// Stored representation used to rehydrate an [`Issue`] from an adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueRecord {
    pub id: IssueId,
    pub title: String,
    pub description: String,
    pub category: IssueCategory,
    pub status: IssueStatus,
    pub location: Location,
    pub images: Vec<String>,
    pub reporter: UserId,
    pub upvoted_by: BTreeSet<UserId>,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reported civic issue.
///
/// ## Invariants
/// - `upvotes()` always equals `upvoted_by().len()`.
/// - At most [`MAX_IMAGES`] image URLs, kept in upload order.
/// - `reporter` never changes after creation.
/// - Comments are append-only and ordered by insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct Issue {
    id: IssueId,
    title: String,
    description: String,
    category: IssueCategory,
    status: IssueStatus,
    location: Location,
    images: Vec<String>,
    reporter: UserId,
    upvoted_by: BTreeSet<UserId>,
    comments: Vec<Comment>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Issue {
    /// Create a freshly reported issue from a validated submission and the
    /// URLs returned by the asset host, in upload order.
    pub fn report(
        id: IssueId,
        submission: NewIssue,
        image_urls: Vec<String>,
        reporter: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        let NewIssue {
            title,
            description,
            category,
            location,
            images: _,
        } = submission;
        let mut images = image_urls;
        images.truncate(MAX_IMAGES);
        Self {
            id,
            title,
            description,
            category,
            status: IssueStatus::Reported,
            location,
            images,
            reporter,
            upvoted_by: BTreeSet::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rehydrate a stored issue. Extra image URLs beyond [`MAX_IMAGES`] are
    /// dropped.
    pub fn restore(record: IssueRecord) -> Self {
        let IssueRecord {
            id,
            title,
            description,
            category,
            status,
            location,
            mut images,
            reporter,
            upvoted_by,
            comments,
            created_at,
            updated_at,
        } = record;
        images.truncate(MAX_IMAGES);
        Self {
            id,
            title,
            description,
            category,
            status,
            location,
            images,
            reporter,
            upvoted_by,
            comments,
            created_at,
            updated_at,
        }
    }

    /// Add `user` to the upvoters, or remove them if already present.
    pub fn toggle_upvote(&mut self, user: UserId) -> UpvoteChange {
        if self.upvoted_by.remove(&user) {
            UpvoteChange::Removed
        } else {
            self.upvoted_by.insert(user);
            UpvoteChange::Added
        }
    }

    /// Overwrite the status unconditionally.
    pub fn set_status(&mut self, status: IssueStatus, now: DateTime<Utc>) {
        self.status = status;
        self.touch(now);
    }

    /// Append a comment.
    pub fn add_comment(&mut self, comment: Comment) {
        let at = comment.created_at;
        self.comments.push(comment);
        self.touch(at);
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }

    pub fn id(&self) -> IssueId {
        self.id
    }

    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    pub fn description(&self) -> &str {
        self.description.as_str()
    }

    pub fn category(&self) -> IssueCategory {
        self.category
    }

    pub fn status(&self) -> IssueStatus {
        self.status
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Image URLs in upload order.
    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn reporter(&self) -> UserId {
        self.reporter
    }

    pub fn upvoted_by(&self) -> &BTreeSet<UserId> {
        &self.upvoted_by
    }

    /// Derived upvote count.
    pub fn upvotes(&self) -> usize {
        self.upvoted_by.len()
    }

    pub fn has_upvoted(&self, user: &UserId) -> bool {
        self.upvoted_by.contains(user)
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

#[cfg(test)]
mod tests;
