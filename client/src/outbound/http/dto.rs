//! Wire DTOs for the portal API.
//!
//! The remote is loose about shapes: identifiers arrive as `_id`, the user
//! may be nested under `user` or spread at the top level, and asset fields
//! are either a URL string or an object carrying `downloadURL`. Everything
//! is decoded into these DTOs first and mapped to domain types in one pass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::domain::ports::RemoteCallError;
use crate::domain::{
    AnswerSlot, Application, ApplicationId, ApplicationStatus, AuthSession, AuthToken,
    CandidateProfile, Category, DocumentReference, Funding, Identity, IdentityId, Opportunity,
    OpportunityId, ProfileSnapshot, Role, parse_deadline,
};

fn decode_error(what: &str, error: impl std::fmt::Display) -> RemoteCallError {
    RemoteCallError::decode(format!("invalid {what} payload: {error}"))
}

/// Unwrap `{key: {...}}` when present, otherwise use the value itself.
fn nested(value: Value, key: &str) -> Value {
    match value {
        Value::Object(mut map) if map.get(key).is_some_and(Value::is_object) => {
            map.remove(key).unwrap_or(Value::Null)
        }
        other => other,
    }
}

#[derive(Debug, Serialize)]
pub(super) struct LoginRequestDto<'a> {
    pub(super) email: &'a str,
    pub(super) password: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct RegisterRequestDto<'a> {
    #[serde(flatten)]
    pub(super) profile: &'a CandidateProfile,
    pub(super) password: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct NewsletterRequestDto<'a> {
    pub(super) email: &'a str,
}

/// URL string, or an object carrying `downloadURL`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum AssetDto {
    Url(String),
    Stored {
        #[serde(rename = "downloadURL", alias = "url", default)]
        download_url: Option<String>,
    },
}

impl AssetDto {
    pub(super) fn into_url(self) -> Option<String> {
        match self {
            Self::Url(url) => Some(url),
            Self::Stored { download_url } => download_url,
        }
        .filter(|url| !url.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDto {
    #[serde(rename = "_id", alias = "id")]
    id: String,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    is_admin: bool,
    #[serde(default)]
    profile_photo: Option<AssetDto>,
}

impl UserDto {
    fn into_identity(self) -> Result<Identity, RemoteCallError> {
        let id = IdentityId::new(self.id).map_err(|error| decode_error("user", error))?;
        Ok(Identity {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            role: if self.is_admin {
                Role::Administrative
            } else {
                Role::Standard
            },
            profile_photo_url: self.profile_photo.and_then(AssetDto::into_url),
        })
    }
}

/// Identity from `{user: {...}}` or a flat user object.
pub(super) fn decode_identity(body: &[u8]) -> Result<Identity, RemoteCallError> {
    let value: Value = serde_json::from_slice(body).map_err(|error| decode_error("user", error))?;
    let user: UserDto =
        serde_json::from_value(nested(value, "user")).map_err(|error| decode_error("user", error))?;
    user.into_identity()
}

/// Session from `{user: {...}, token}` or flat user fields beside `token`.
pub(super) fn decode_auth(body: &[u8]) -> Result<AuthSession, RemoteCallError> {
    let value: Value = serde_json::from_slice(body).map_err(|error| decode_error("auth", error))?;
    let token = value
        .get("token")
        .and_then(Value::as_str)
        .ok_or_else(|| RemoteCallError::decode("auth response has no token"))?;
    let token = AuthToken::new(token).map_err(|error| decode_error("auth", error))?;
    let user: UserDto =
        serde_json::from_value(nested(value, "user")).map_err(|error| decode_error("auth", error))?;
    Ok(AuthSession {
        identity: user.into_identity()?,
        token,
    })
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QuestionDto {
    Text(String),
    Prompt { question: String },
}

impl QuestionDto {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) | Self::Prompt { question: text } => text,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpportunityDto {
    #[serde(rename = "_id", alias = "id")]
    id: String,
    #[serde(default)]
    title: String,
    category: String,
    #[serde(default)]
    provider: String,
    #[serde(default, alias = "field")]
    field_of_study: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    funding: Funding,
    #[serde(default, alias = "minAverage")]
    minimum_average: Option<serde_json::Number>,
    #[serde(alias = "applicationDeadline")]
    deadline: String,
    #[serde(default)]
    questions: Vec<QuestionDto>,
    #[serde(default, alias = "documentsRequired")]
    required_documents: Vec<String>,
    #[serde(default)]
    description: Option<String>,
}

impl OpportunityDto {
    fn into_domain(self) -> Result<Opportunity, String> {
        let id = OpportunityId::new(self.id).map_err(|error| error.to_string())?;
        let category: Category = self
            .category
            .trim()
            .to_ascii_lowercase()
            .parse()
            .map_err(|error: crate::domain::OpportunityValidationError| {
                format!("listing {id}: {error}")
            })?;
        let deadline =
            parse_deadline(&self.deadline).map_err(|error| format!("listing {id}: {error}"))?;
        Ok(Opportunity {
            id,
            title: self.title,
            category,
            provider: self.provider,
            field_of_study: self.field_of_study,
            location: self.location,
            funding: self.funding,
            minimum_average: self.minimum_average.as_ref().and_then(percentage),
            deadline,
            questions: self.questions.into_iter().map(QuestionDto::into_text).collect(),
            required_documents: self.required_documents,
            description: self.description.filter(|text| !text.trim().is_empty()),
        })
    }
}

fn percentage(number: &serde_json::Number) -> Option<u8> {
    if let Some(whole) = number.as_u64() {
        return u8::try_from(whole).ok();
    }
    let rounded = format!("{:.0}", number.as_f64()?);
    rounded.parse().ok()
}

/// Decode listings one by one, skipping entries the client cannot model.
pub(super) fn decode_opportunities(items: Vec<Value>) -> Vec<Opportunity> {
    items
        .into_iter()
        .filter_map(|item| {
            let decoded = serde_json::from_value::<OpportunityDto>(item)
                .map_err(|error| error.to_string())
                .and_then(OpportunityDto::into_domain);
            match decoded {
                Ok(opportunity) => Some(opportunity),
                Err(reason) => {
                    warn!(reason = %reason, "skipping listing");
                    None
                }
            }
        })
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ReferenceDto {
    Id(String),
    Expanded {
        #[serde(rename = "_id", alias = "id")]
        id: String,
        #[serde(default)]
        title: Option<String>,
    },
}

impl ReferenceDto {
    fn split(self) -> (String, Option<String>) {
        match self {
            Self::Id(id) => (id, None),
            Self::Expanded { id, title } => (id, title),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentDto {
    #[serde(default, alias = "filename")]
    name: String,
    #[serde(default)]
    firebase_name: Option<String>,
    #[serde(rename = "downloadURL", alias = "url")]
    download_url: String,
    #[serde(default)]
    uploaded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApplicationDto {
    #[serde(rename = "_id", alias = "id")]
    id: String,
    #[serde(default)]
    opportunity: Option<ReferenceDto>,
    #[serde(default)]
    opportunity_id: Option<String>,
    #[serde(default, alias = "student", alias = "user")]
    applicant: Option<ReferenceDto>,
    #[serde(default)]
    answers: Vec<AnswerSlot>,
    #[serde(default)]
    documents: Vec<DocumentDto>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, alias = "applicationDate", alias = "createdAt")]
    submitted_at: Option<DateTime<Utc>>,
}

impl ApplicationDto {
    fn into_domain(self) -> Result<Application, String> {
        let (opportunity_id, opportunity_title) = match (self.opportunity, self.opportunity_id) {
            (Some(reference), _) => reference.split(),
            (None, Some(id)) => (id, None),
            (None, None) => return Err(format!("application {} names no opportunity", self.id)),
        };
        let opportunity_id = OpportunityId::new(opportunity_id).map_err(|error| error.to_string())?;
        let applicant_id = self
            .applicant
            .map(|reference| IdentityId::new(reference.split().0))
            .transpose()
            .map_err(|error| error.to_string())?;
        let status = match self.status {
            None => ApplicationStatus::default(),
            Some(raw) => raw.parse().unwrap_or_else(|unknown: String| {
                warn!(error = %unknown, "treating application as pending");
                ApplicationStatus::default()
            }),
        };
        let uploaded_fallback = self.submitted_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
        let documents = self
            .documents
            .into_iter()
            .map(|document| DocumentReference {
                name: document.name,
                storage_key: document.firebase_name,
                url: document.download_url,
                uploaded_at: document.uploaded_at.unwrap_or(uploaded_fallback),
            })
            .collect();
        Ok(Application {
            id: ApplicationId::new(self.id),
            opportunity_id,
            applicant_id,
            opportunity_title,
            answers: self.answers,
            documents,
            status,
            submitted_at: self.submitted_at,
        })
    }
}

/// Application record from `{application: {...}}` or a flat record.
pub(super) fn decode_application(body: &[u8]) -> Result<Application, RemoteCallError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|error| decode_error("application", error))?;
    serde_json::from_value::<ApplicationDto>(nested(value, "application"))
        .map_err(|error| decode_error("application", error))?
        .into_domain()
        .map_err(RemoteCallError::decode)
}

#[derive(Debug, Deserialize)]
struct MyApplicationsDto {
    #[serde(default)]
    applications: Vec<Value>,
}

/// Applications from `{applications: [...]}`, skipping undecodable records.
pub(super) fn decode_my_applications(body: &[u8]) -> Result<Vec<Application>, RemoteCallError> {
    let decoded: MyApplicationsDto =
        serde_json::from_slice(body).map_err(|error| decode_error("applications", error))?;
    Ok(decoded
        .applications
        .into_iter()
        .filter_map(|item| {
            let record = serde_json::from_value::<ApplicationDto>(item)
                .map_err(|error| error.to_string())
                .and_then(ApplicationDto::into_domain);
            match record {
                Ok(application) => Some(application),
                Err(reason) => {
                    warn!(reason = %reason, "skipping application record");
                    None
                }
            }
        })
        .collect())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponseDto {
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    firebase_name: Option<String>,
    #[serde(rename = "downloadURL", alias = "url")]
    download_url: String,
}

/// Document reference from an upload response.
///
/// The local file name stands in when the remote omits `filename`.
pub(super) fn decode_upload(
    body: &[u8],
    local_name: &str,
    uploaded_at: DateTime<Utc>,
) -> Result<DocumentReference, RemoteCallError> {
    let decoded: UploadResponseDto =
        serde_json::from_slice(body).map_err(|error| decode_error("upload", error))?;
    Ok(DocumentReference {
        name: decoded
            .filename
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| local_name.to_owned()),
        storage_key: decoded.firebase_name,
        url: decoded.download_url,
        uploaded_at,
    })
}

/// Asset URL under `field` in a profile upload response.
pub(super) fn decode_asset_url(body: &[u8], field: &str) -> Result<String, RemoteCallError> {
    let mut value: Value =
        serde_json::from_slice(body).map_err(|error| decode_error("profile upload", error))?;
    let asset = value
        .get_mut(field)
        .map(Value::take)
        .ok_or_else(|| RemoteCallError::decode(format!("profile upload response has no {field}")))?;
    serde_json::from_value::<AssetDto>(asset)
        .map_err(|error| decode_error("profile upload", error))?
        .into_url()
        .ok_or_else(|| RemoteCallError::decode(format!("profile upload {field} has no URL")))
}

/// Profile from `{user: {...}}`, `{profile: {...}}`, or a flat object.
pub(super) fn decode_profile(body: &[u8]) -> Result<ProfileSnapshot, RemoteCallError> {
    let value: Value = serde_json::from_slice(body).map_err(|error| decode_error("profile", error))?;
    let mut value = nested(nested(value, "user"), "profile");
    let mut take_asset = |key: &str| {
        value
            .get_mut(key)
            .map(Value::take)
            .and_then(|raw| serde_json::from_value::<Option<AssetDto>>(raw).ok().flatten())
            .and_then(AssetDto::into_url)
    };
    let profile_photo_url = take_asset("profilePhoto");
    let resume_url = take_asset("resume");
    let profile: CandidateProfile =
        serde_json::from_value(value).map_err(|error| decode_error("profile", error))?;
    Ok(ProfileSnapshot {
        profile,
        profile_photo_url,
        resume_url,
    })
}

#[cfg(test)]
mod tests {
    //! Regression coverage for wire decoding.
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;
    use serde_json::json;

    fn bytes(value: &Value) -> Vec<u8> {
        serde_json::to_vec(value).expect("encode")
    }

    #[rstest]
    #[case::nested(json!({
        "token": "tok",
        "user": { "_id": "u1", "firstName": "Zanele", "lastName": "Mthembu",
                  "email": "z@example.com", "isAdmin": true }
    }))]
    #[case::flat(json!({
        "token": "tok", "_id": "u1", "firstName": "Zanele", "lastName": "Mthembu",
        "email": "z@example.com", "isAdmin": true, "profilePhoto": {}
    }))]
    fn auth_shapes_decode_alike(#[case] body: Value) {
        let session = decode_auth(&bytes(&body)).expect("decode");
        assert_eq!(session.token.expose(), "tok");
        assert_eq!(session.identity.id.as_ref(), "u1");
        assert!(session.identity.is_admin());
        assert_eq!(session.identity.profile_photo_url, None);
    }

    #[test]
    fn auth_without_token_is_a_decode_error() {
        let error = decode_auth(&bytes(&json!({ "user": { "_id": "u1" } }))).expect_err("no token");
        assert!(matches!(error, RemoteCallError::Decode { .. }));
    }

    #[test]
    fn photo_object_yields_its_url() {
        let identity = decode_identity(&bytes(&json!({
            "_id": "u1",
            "profilePhoto": { "downloadURL": "https://cdn.example/p.jpg" }
        })))
        .expect("decode");
        assert_eq!(identity.profile_photo_url.as_deref(), Some("https://cdn.example/p.jpg"));
    }

    #[test]
    fn opportunity_fields_use_the_remote_names() {
        let listings = decode_opportunities(vec![json!({
            "_id": "o1",
            "title": "Mining Bursary",
            "category": "Bursary",
            "field": "Engineering",
            "applicationDeadline": "2026-09-30",
            "minAverage": 65.4,
            "questions": ["Why mining?", { "question": "Where do you live?" }],
            "documentsRequired": ["CV", "ID"],
            "funding": { "tuition": "Full" }
        })]);
        let listing = listings.first().expect("one listing");
        assert_eq!(listing.category, Category::Bursary);
        assert_eq!(listing.field_of_study, "Engineering");
        assert_eq!(listing.minimum_average, Some(65));
        assert_eq!(listing.questions, ["Why mining?", "Where do you live?"]);
        assert_eq!(listing.required_documents, ["CV", "ID"]);
        assert_eq!(listing.funding.tuition.as_deref(), Some("Full"));
        assert_eq!(
            listing.deadline,
            Utc.with_ymd_and_hms(2026, 9, 30, 0, 0, 0).single().expect("time")
        );
    }

    #[test]
    fn unknown_categories_are_skipped() {
        let listings = decode_opportunities(vec![
            json!({ "_id": "o1", "category": "apprenticeship", "deadline": "2026-01-01" }),
            json!({ "_id": "o2", "category": "graduate", "deadline": "2026-01-01" }),
        ]);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings.first().map(|o| o.id.as_ref()), Some("o2"));
    }

    #[test]
    fn application_with_expanded_opportunity() {
        let application = decode_application(&bytes(&json!({
            "application": {
                "_id": "a1",
                "opportunity": { "_id": "o1", "title": "Mining Bursary" },
                "student": "u1",
                "answers": [{ "question": "Why?", "answer": "Because" }],
                "documents": [{ "name": "CV.pdf", "downloadURL": "https://f.example/cv" }],
                "status": "Under Review",
                "applicationDate": "2026-03-01T10:00:00Z"
            }
        })))
        .expect("decode");
        assert_eq!(application.opportunity_id.as_ref(), "o1");
        assert_eq!(application.opportunity_title.as_deref(), Some("Mining Bursary"));
        assert_eq!(application.applicant_id.map(String::from), Some("u1".to_owned()));
        assert_eq!(application.status, ApplicationStatus::UnderReview);
        assert_eq!(application.documents.len(), 1);
        assert_eq!(application.submitted_at, application.documents.first().map(|d| d.uploaded_at));
    }

    #[test]
    fn my_applications_skip_bad_records() {
        let records = decode_my_applications(&bytes(&json!({
            "applications": [
                { "_id": "a1", "opportunityId": "o1" },
                { "_id": "a2" }
            ]
        })))
        .expect("decode");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn upload_name_falls_back_to_the_local_name() {
        let at = Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).single().expect("time");
        let reference = decode_upload(
            br#"{"downloadURL":"https://f.example/x","firebaseName":"docs/x"}"#,
            "CV.pdf",
            at,
        )
        .expect("decode");
        assert_eq!(reference.name, "CV.pdf");
        assert_eq!(reference.storage_key.as_deref(), Some("docs/x"));
    }

    #[rstest]
    #[case(json!({ "profilePhoto": "https://cdn.example/p.png" }))]
    #[case(json!({ "profilePhoto": { "downloadURL": "https://cdn.example/p.png" } }))]
    fn asset_url_accepts_both_shapes(#[case] body: Value) {
        assert_eq!(
            decode_asset_url(&bytes(&body), "profilePhoto").expect("decode"),
            "https://cdn.example/p.png"
        );
    }

    #[test]
    fn profile_strips_asset_objects() {
        let snapshot = decode_profile(&bytes(&json!({
            "user": {
                "firstName": "Zanele",
                "education": { "institution": "UCT" },
                "profilePhoto": { "downloadURL": "https://cdn.example/p.png" },
                "resume": null
            }
        })))
        .expect("decode");
        assert_eq!(snapshot.profile.first_name, "Zanele");
        assert_eq!(snapshot.profile.education.institution, "UCT");
        assert_eq!(snapshot.profile_photo_url.as_deref(), Some("https://cdn.example/p.png"));
        assert_eq!(snapshot.resume_url, None);
    }
}
