//! Tests for the issue aggregate and submission validation.

use super::*;
use chrono::{TimeDelta, TimeZone};
use rstest::{fixture, rstest};

#[fixture]
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 4, 2, 8, 15, 0)
        .single()
        .expect("valid fixture timestamp")
}

fn parts<'a>() -> NewIssueParts<'a> {
    NewIssueParts {
        title: Some("Pothole"),
        description: Some("Deep pothole near the bus stop"),
        category: Some("pothole"),
        address: Some("5th Ave"),
        latitude: Some("1.0"),
        longitude: Some("2.0"),
    }
}

fn png(index: usize) -> ImageUpload {
    ImageUpload::new(
        index,
        Some(format!("photo-{index}.png")),
        "image/png",
        vec![0x89, b'P', b'N', b'G'],
    )
    .expect("valid image")
}

#[fixture]
fn issue(now: DateTime<Utc>) -> Issue {
    let submission = NewIssue::try_from_parts(parts(), Vec::new()).expect("valid submission");
    Issue::report(IssueId::random(), submission, Vec::new(), UserId::random(), now)
}

#[rstest]
fn categories_round_trip_through_wire_names() {
    for category in IssueCategory::ALL {
        assert_eq!(category.as_str().parse::<IssueCategory>(), Ok(category));
        let json = serde_json::to_value(category).expect("serialise category");
        assert_eq!(json, serde_json::Value::from(category.as_str()));
    }
}

#[rstest]
#[case("in-progress", IssueStatus::InProgress)]
#[case("resolved", IssueStatus::Resolved)]
fn statuses_parse_kebab_case(#[case] raw: &str, #[case] expected: IssueStatus) {
    assert_eq!(raw.parse::<IssueStatus>(), Ok(expected));
}

#[rstest]
#[case("in_progress")]
#[case("Resolved")]
#[case("closed")]
fn statuses_reject_unknown_values(#[case] raw: &str) {
    assert!(raw.parse::<IssueStatus>().is_err());
}

#[rstest]
fn submission_reports_every_invalid_field() {
    let errors = NewIssue::try_from_parts(NewIssueParts::default(), Vec::new())
        .expect_err("empty submission");
    let fields: Vec<&str> = errors.errors().iter().map(|error| error.field).collect();
    assert_eq!(
        fields,
        ["title", "description", "category", "address", "latitude", "longitude"]
    );
}

#[rstest]
#[case(Some("abc"), Some("2.0"), "latitude")]
#[case(Some("91"), Some("2.0"), "latitude")]
#[case(Some("1.0"), Some("-180.5"), "longitude")]
#[case(Some("NaN"), Some("2.0"), "latitude")]
#[case(Some("1.0"), Some("inf"), "longitude")]
fn submission_rejects_bad_coordinates(
    #[case] latitude: Option<&str>,
    #[case] longitude: Option<&str>,
    #[case] field: &str,
) {
    let errors = NewIssue::try_from_parts(
        NewIssueParts {
            latitude,
            longitude,
            ..parts()
        },
        Vec::new(),
    )
    .expect_err("invalid coordinates");
    assert!(errors.contains(field));
}

#[rstest]
fn submission_rejects_unknown_category() {
    let errors = NewIssue::try_from_parts(
        NewIssueParts {
            category: Some("graffiti"),
            ..parts()
        },
        Vec::new(),
    )
    .expect_err("unknown category");
    assert!(errors.contains("category"));
}

#[rstest]
fn submission_accepts_five_images_and_rejects_six() {
    let five: Vec<ImageUpload> = (0..MAX_IMAGES).map(png).collect();
    let accepted = NewIssue::try_from_parts(parts(), five).expect("five images accepted");
    assert_eq!(accepted.images().len(), MAX_IMAGES);

    let six: Vec<ImageUpload> = (0..=MAX_IMAGES).map(png).collect();
    let errors = NewIssue::try_from_parts(parts(), six).expect_err("six images rejected");
    assert_eq!(errors.errors()[0].code, "too_many");
}

#[rstest]
fn image_upload_rejects_non_images() {
    let error = ImageUpload::new(0, None, "application/pdf", vec![1, 2, 3])
        .expect_err("pdf rejected");
    assert_eq!(error.code, "unsupported_type");
}

#[rstest]
fn image_upload_rejects_oversized_files() {
    let error = ImageUpload::new(2, None, "image/jpeg", vec![0; MAX_IMAGE_BYTES + 1])
        .expect_err("oversized rejected");
    assert_eq!(error.code, "too_large");
}

#[rstest]
fn report_starts_reported_with_no_upvotes(issue: Issue, now: DateTime<Utc>) {
    assert_eq!(issue.status(), IssueStatus::Reported);
    assert_eq!(issue.upvotes(), 0);
    assert_eq!(issue.created_at(), now);
    assert_eq!(issue.location().address, "5th Ave");
}

#[rstest]
fn report_keeps_image_urls_in_upload_order(now: DateTime<Utc>) {
    let submission = NewIssue::try_from_parts(parts(), Vec::new()).expect("valid submission");
    let urls: Vec<String> = (0..3).map(|i| format!("https://cdn.test/{i}.jpg")).collect();
    let issue = Issue::report(IssueId::random(), submission, urls.clone(), UserId::random(), now);
    assert_eq!(issue.images(), urls.as_slice());
}

#[rstest]
fn toggle_upvote_is_an_involution(mut issue: Issue) {
    let voter = UserId::random();
    let before = issue.clone();

    assert_eq!(issue.toggle_upvote(voter), UpvoteChange::Added);
    assert_eq!(issue.upvotes(), 1);
    assert!(issue.has_upvoted(&voter));

    assert_eq!(issue.toggle_upvote(voter), UpvoteChange::Removed);
    assert_eq!(issue, before);
}

#[rstest]
fn upvote_count_tracks_membership(mut issue: Issue) {
    let voters: Vec<UserId> = (0..4).map(|_| UserId::random()).collect();
    for voter in &voters {
        issue.toggle_upvote(*voter);
    }
    issue.toggle_upvote(voters[1]);
    assert_eq!(issue.upvotes(), issue.upvoted_by().len());
    assert_eq!(issue.upvotes(), 3);
}

#[rstest]
fn comments_append_in_order_and_touch_updated_at(mut issue: Issue, now: DateTime<Utc>) {
    let later = now + TimeDelta::minutes(5);
    let author = UserId::random();
    issue.add_comment(Comment::new(
        author,
        CommentText::new("first").expect("valid text"),
        now,
    ));
    issue.add_comment(Comment::new(
        author,
        CommentText::new("  second ").expect("valid text"),
        later,
    ));

    let texts: Vec<&str> = issue.comments().iter().map(|c| c.text.as_ref()).collect();
    assert_eq!(texts, ["first", "second"]);
    assert_eq!(issue.updated_at(), later);
}

#[rstest]
#[case("")]
#[case("   \n")]
fn comment_text_rejects_blank_input(#[case] raw: &str) {
    assert!(CommentText::new(raw).is_err());
}

#[rstest]
fn set_status_allows_any_transition(mut issue: Issue, now: DateTime<Utc>) {
    issue.set_status(IssueStatus::Resolved, now + TimeDelta::days(2));
    issue.set_status(IssueStatus::Acknowledged, now + TimeDelta::days(3));
    assert_eq!(issue.status(), IssueStatus::Acknowledged);
    assert_eq!(issue.updated_at(), now + TimeDelta::days(3));
}
