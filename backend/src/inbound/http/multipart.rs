//! Streaming parser for multipart issue submissions.
//!
//! Text fields are buffered up to [`TEXT_FIELD_MAX_BYTES`]; photo parts are
//! buffered up to [`MAX_IMAGE_BYTES`] and any excess is drained without being
//! stored. Every problem is collected so one response lists all failing
//! fields. The whole body, drained parts included, may not exceed
//! [`BODY_MAX_BYTES`]; past that the request fails at once.

use actix_multipart::{Field, Multipart};
use futures_util::TryStreamExt as _;

use crate::domain::{
    Error, FieldError, FieldErrors, ImageUpload, MAX_IMAGE_BYTES, MAX_IMAGES, NewIssue,
    NewIssueParts, image_too_large, too_many_images,
};

/// Upper bound for a single text part.
pub const TEXT_FIELD_MAX_BYTES: usize = 64 * 1024;

/// Upper bound for all parts of one submission together.
pub const BODY_MAX_BYTES: usize = MAX_IMAGES * MAX_IMAGE_BYTES + 6 * TEXT_FIELD_MAX_BYTES;

const IMAGE_FIELDS: [&str; 2] = ["images", "images[]"];

/// Bytes left before the body is rejected outright.
struct Budget(usize);

impl Budget {
    fn spend(&mut self, bytes: usize) -> Result<(), Error> {
        self.0 = self.0.checked_sub(bytes).ok_or_else(|| {
            Error::invalid_request(format!("request body exceeds {BODY_MAX_BYTES} bytes"))
        })?;
        Ok(())
    }
}

/// Text fields of an issue submission.
#[derive(Debug, Default)]
struct TextFields {
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    address: Option<String>,
    latitude: Option<String>,
    longitude: Option<String>,
}

impl TextFields {
    fn slot(&mut self, name: &str) -> Option<&mut Option<String>> {
        match name {
            "title" => Some(&mut self.title),
            "description" => Some(&mut self.description),
            "category" => Some(&mut self.category),
            "address" => Some(&mut self.address),
            "latitude" => Some(&mut self.latitude),
            "longitude" => Some(&mut self.longitude),
            _ => None,
        }
    }

    fn parts(&self) -> NewIssueParts<'_> {
        NewIssueParts {
            title: self.title.as_deref(),
            description: self.description.as_deref(),
            category: self.category.as_deref(),
            address: self.address.as_deref(),
            latitude: self.latitude.as_deref(),
            longitude: self.longitude.as_deref(),
        }
    }
}

fn malformed(error: impl std::fmt::Display) -> Error {
    Error::invalid_request(format!("malformed multipart body: {error}"))
}

/// Read a part into memory, returning `None` once it exceeds `limit`.
///
/// Oversized parts are drained so the stream can advance to the next part.
async fn read_limited(
    field: &mut Field,
    limit: usize,
    budget: &mut Budget,
) -> Result<Option<Vec<u8>>, Error> {
    let mut buffer = Vec::new();
    let mut overflowed = false;
    while let Some(chunk) = field.try_next().await.map_err(malformed)? {
        budget.spend(chunk.len())?;
        if overflowed {
            continue;
        }
        if buffer.len() + chunk.len() > limit {
            overflowed = true;
            buffer = Vec::new();
            continue;
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok((!overflowed).then_some(buffer))
}

async fn drain(field: &mut Field, budget: &mut Budget) -> Result<(), Error> {
    while let Some(chunk) = field.try_next().await.map_err(malformed)? {
        budget.spend(chunk.len())?;
    }
    Ok(())
}

/// Parse and validate a multipart issue submission.
///
/// # Errors
/// Returns `invalid_request` with a `details.errors` list when any field or
/// photo fails validation, when the body is not valid multipart, or when it
/// exceeds [`BODY_MAX_BYTES`].
pub async fn read_issue_submission(payload: Multipart) -> Result<NewIssue, Error> {
    read_within(payload, Budget(BODY_MAX_BYTES)).await
}

async fn read_within(mut payload: Multipart, mut budget: Budget) -> Result<NewIssue, Error> {
    let mut text = TextFields::default();
    let mut images = Vec::new();
    let mut errors = FieldErrors::default();
    let mut image_count = 0_usize;

    while let Some(mut field) = payload.try_next().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_owned();

        if IMAGE_FIELDS.contains(&name.as_str()) {
            let index = image_count;
            image_count += 1;
            if index >= MAX_IMAGES {
                if index == MAX_IMAGES {
                    errors.push(too_many_images());
                }
                drain(&mut field, &mut budget).await?;
                continue;
            }
            let file_name = field
                .content_disposition()
                .and_then(|disposition| disposition.get_filename())
                .map(str::to_owned);
            let content_type = field
                .content_type()
                .map(|mime| mime.essence_str().to_owned())
                .unwrap_or_default();
            match read_limited(&mut field, MAX_IMAGE_BYTES, &mut budget).await? {
                Some(bytes) => match ImageUpload::new(index, file_name, content_type, bytes) {
                    Ok(image) => images.push(image),
                    Err(error) => errors.push(error),
                },
                None => errors.push(image_too_large(index)),
            }
            continue;
        }

        let Some(slot) = text.slot(&name) else {
            drain(&mut field, &mut budget).await?;
            continue;
        };
        match read_limited(&mut field, TEXT_FIELD_MAX_BYTES, &mut budget).await? {
            Some(bytes) => match String::from_utf8(bytes) {
                Ok(value) => *slot = Some(value),
                Err(_) => errors.push(FieldError::new(
                    "form",
                    "invalid_utf8",
                    format!("{name} must be UTF-8 text"),
                )),
            },
            None => errors.push(FieldError::new(
                "form",
                "too_large",
                format!("{name} exceeds {TEXT_FIELD_MAX_BYTES} bytes"),
            )),
        }
    }

    match NewIssue::try_from_parts(text.parts(), images) {
        Ok(submission) if errors.is_empty() => Ok(submission),
        Ok(_) => Err(errors.into_error()),
        Err(field_errors) => {
            for error in field_errors.errors() {
                errors.push(error.clone());
            }
            Err(errors.into_error())
        }
    }
}
