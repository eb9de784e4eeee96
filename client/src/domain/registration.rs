//! Candidate profile and the three-step registration wizard.
//!
//! Each step validates only its own fields; errors are keyed by the form
//! field name so a presentation layer can place them next to the input.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use zeroize::Zeroizing;

use super::Error;

/// Minimum accepted password length.
pub const PASSWORD_MIN: usize = 6;

/// Field-keyed validation messages.
pub type FieldErrors = BTreeMap<String, String>;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"\S+@\S+\.\S+")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Loose address check: something, an `@`, something, a dot, something.
pub fn is_plausible_email(candidate: &str) -> bool {
    email_regex().is_match(candidate)
}

/// Convert field errors into a [`Error`] with [`super::ErrorCode::Validation`].
pub fn field_errors_to_error(message: &str, fields: &FieldErrors) -> Error {
    Error::validation(message).with_details(json!({ "fields": fields }))
}

/// Postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    /// Street line.
    pub street: String,
    /// City or town.
    pub city: String,
    /// Province.
    pub province: String,
    /// Postal code.
    pub postal_code: String,
}

/// Education history used for eligibility.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Education {
    /// Institution name.
    pub institution: String,
    /// Qualification being studied.
    pub qualification: String,
    /// Field of study.
    pub field_of_study: String,
    /// Current year of study.
    pub year_of_study: String,
    /// Expected graduation year.
    pub graduation_year: String,
    /// Average marks, as entered.
    pub average_marks: String,
}

/// Full candidate profile shared by registration and profile updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CandidateProfile {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact and login email.
    pub email: String,
    /// Phone number.
    pub phone: String,
    /// Date of birth in `YYYY-MM-DD` form.
    pub date_of_birth: String,
    /// National identity number.
    pub id_number: String,
    /// Gender, as selected.
    pub gender: String,
    /// Population group, as selected.
    pub race: String,
    /// Postal address.
    pub address: Address,
    /// Education history.
    pub education: Education,
    /// Free-form skills.
    pub skills: Vec<String>,
}

impl CandidateProfile {
    /// Replace the skills list from a comma-separated string.
    ///
    /// Blank entries are discarded and each skill is trimmed.
    pub fn set_skills_from_csv(&mut self, raw: &str) {
        self.skills = raw
            .split(',')
            .map(str::trim)
            .filter(|skill| !skill.is_empty())
            .map(str::to_owned)
            .collect();
    }
}

/// Raw registration form state.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RegistrationForm {
    /// Profile fields collected across the steps.
    pub profile: CandidateProfile,
    /// Chosen password.
    pub password: Zeroizing<String>,
    /// Password confirmation.
    pub confirm_password: Zeroizing<String>,
}

impl fmt::Debug for RegistrationForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationForm")
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

/// Validated registration payload ready for the remote service.
#[derive(Clone, PartialEq, Eq)]
pub struct Registration {
    /// Candidate profile.
    pub profile: CandidateProfile,
    password: Zeroizing<String>,
}

impl Registration {
    /// Password to send with the registration request.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

/// Wizard step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RegistrationStep {
    /// Name, email, and password.
    Account,
    /// Phone, date of birth, identity number, gender, race.
    Personal,
    /// Institution, qualification, field of study.
    Education,
}

impl RegistrationStep {
    const fn next(self) -> Option<Self> {
        match self {
            Self::Account => Some(Self::Personal),
            Self::Personal => Some(Self::Education),
            Self::Education => None,
        }
    }

    const fn previous(self) -> Option<Self> {
        match self {
            Self::Account => None,
            Self::Personal => Some(Self::Account),
            Self::Education => Some(Self::Personal),
        }
    }
}

fn require(errors: &mut FieldErrors, field: &str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.insert(field.to_owned(), message.to_owned());
    }
}

/// Validate the fields owned by `step`.
pub fn validate_step(step: RegistrationStep, form: &RegistrationForm) -> FieldErrors {
    let mut errors = FieldErrors::new();
    let profile = &form.profile;
    match step {
        RegistrationStep::Account => {
            require(&mut errors, "firstName", &profile.first_name, "First name is required");
            require(&mut errors, "lastName", &profile.last_name, "Last name is required");
            if profile.email.trim().is_empty() {
                errors.insert("email".to_owned(), "Email is required".to_owned());
            } else if !is_plausible_email(profile.email.trim()) {
                errors.insert("email".to_owned(), "Email is invalid".to_owned());
            }
            if form.password.is_empty() {
                errors.insert("password".to_owned(), "Password is required".to_owned());
            } else if form.password.chars().count() < PASSWORD_MIN {
                errors.insert(
                    "password".to_owned(),
                    format!("Password must be at least {PASSWORD_MIN} characters"),
                );
            }
            if form.password != form.confirm_password {
                errors.insert(
                    "confirmPassword".to_owned(),
                    "Passwords do not match".to_owned(),
                );
            }
        }
        RegistrationStep::Personal => {
            require(&mut errors, "phone", &profile.phone, "Phone number is required");
            require(
                &mut errors,
                "dateOfBirth",
                &profile.date_of_birth,
                "Date of birth is required",
            );
            require(&mut errors, "idNumber", &profile.id_number, "ID number is required");
            require(&mut errors, "gender", &profile.gender, "Gender is required");
            require(&mut errors, "race", &profile.race, "Race is required");
        }
        RegistrationStep::Education => {
            let education = &profile.education;
            require(
                &mut errors,
                "institution",
                &education.institution,
                "Institution is required",
            );
            require(
                &mut errors,
                "qualification",
                &education.qualification,
                "Qualification is required",
            );
            require(
                &mut errors,
                "fieldOfStudy",
                &education.field_of_study,
                "Field of study is required",
            );
        }
    }
    errors
}

/// Multi-step registration form state.
///
/// # Examples
/// ```
/// use portal_client::domain::{RegistrationStep, RegistrationWizard};
///
/// let mut wizard = RegistrationWizard::new();
/// assert!(wizard.advance().is_err());
/// assert_eq!(wizard.step(), RegistrationStep::Account);
/// assert!(wizard.errors().contains_key("email"));
/// ```
#[derive(Debug, Clone)]
pub struct RegistrationWizard {
    step: RegistrationStep,
    form: RegistrationForm,
    errors: FieldErrors,
}

impl Default for RegistrationWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrationWizard {
    /// Start at the account step with an empty form.
    pub fn new() -> Self {
        Self {
            step: RegistrationStep::Account,
            form: RegistrationForm::default(),
            errors: FieldErrors::new(),
        }
    }

    /// Current step.
    pub fn step(&self) -> RegistrationStep {
        self.step
    }

    /// Errors from the most recent validation.
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Read access to the form.
    pub fn form(&self) -> &RegistrationForm {
        &self.form
    }

    /// Mutable access to the form for input binding.
    pub fn form_mut(&mut self) -> &mut RegistrationForm {
        &mut self.form
    }

    /// Clear the error attached to `field`, as when the user edits it.
    pub fn clear_error(&mut self, field: &str) {
        self.errors.remove(field);
    }

    /// Validate the current step and move forward.
    ///
    /// Returns the field errors and stays put when the step is incomplete or
    /// when already on the final step.
    pub fn advance(&mut self) -> Result<RegistrationStep, FieldErrors> {
        self.errors = validate_step(self.step, &self.form);
        if !self.errors.is_empty() {
            return Err(self.errors.clone());
        }
        match self.step.next() {
            Some(next) => {
                self.step = next;
                Ok(next)
            }
            None => Ok(self.step),
        }
    }

    /// Move back one step without validating.
    pub fn back(&mut self) -> RegistrationStep {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }

    /// Validate every step and produce the registration payload.
    pub fn finish(&mut self) -> Result<Registration, FieldErrors> {
        if self.step != RegistrationStep::Education {
            return Err(validate_step(self.step, &self.form));
        }
        let mut errors = FieldErrors::new();
        for step in [
            RegistrationStep::Account,
            RegistrationStep::Personal,
            RegistrationStep::Education,
        ] {
            errors.extend(validate_step(step, &self.form));
        }
        self.errors = errors;
        if !self.errors.is_empty() {
            return Err(self.errors.clone());
        }

        let mut profile = self.form.profile.clone();
        profile.email = profile.email.trim().to_owned();
        Ok(Registration {
            profile,
            password: self.form.password.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn complete_form() -> RegistrationForm {
        let mut form = RegistrationForm::default();
        form.profile.first_name = "Ayanda".to_owned();
        form.profile.last_name = "Dlamini".to_owned();
        form.profile.email = "ayanda@example.com".to_owned();
        form.password = Zeroizing::new("secret1".to_owned());
        form.confirm_password = Zeroizing::new("secret1".to_owned());
        form.profile.phone = "0821234567".to_owned();
        form.profile.date_of_birth = "2003-04-12".to_owned();
        form.profile.id_number = "0304125800087".to_owned();
        form.profile.gender = "female".to_owned();
        form.profile.race = "african".to_owned();
        form.profile.education.institution = "University of Cape Town".to_owned();
        form.profile.education.qualification = "BSc".to_owned();
        form.profile.education.field_of_study = "Computer Science".to_owned();
        form
    }

    #[rstest]
    #[case("ayanda@example.com", true)]
    #[case("a@b.co", true)]
    #[case("ayanda@example", false)]
    #[case("ayanda.example.com", false)]
    fn email_shape_check(#[case] email: &str, #[case] expected: bool) {
        assert_eq!(is_plausible_email(email), expected);
    }

    #[rstest]
    fn account_step_reports_short_and_mismatched_passwords(mut complete_form: RegistrationForm) {
        complete_form.password = Zeroizing::new("abc".to_owned());
        let errors = validate_step(RegistrationStep::Account, &complete_form);
        assert_eq!(
            errors.get("password").map(String::as_str),
            Some("Password must be at least 6 characters")
        );
        assert!(errors.contains_key("confirmPassword"));
    }

    #[rstest]
    fn personal_step_requires_every_field() {
        let errors = validate_step(RegistrationStep::Personal, &RegistrationForm::default());
        let keys: Vec<_> = errors.keys().map(String::as_str).collect();
        assert_eq!(keys, ["dateOfBirth", "gender", "idNumber", "phone", "race"]);
    }

    #[rstest]
    fn wizard_walks_all_steps_and_finishes(complete_form: RegistrationForm) {
        let mut wizard = RegistrationWizard::new();
        *wizard.form_mut() = complete_form;
        assert_eq!(wizard.advance(), Ok(RegistrationStep::Personal));
        assert_eq!(wizard.advance(), Ok(RegistrationStep::Education));
        let registration = wizard.finish().expect("complete form");
        assert_eq!(registration.password(), "secret1");
        assert_eq!(registration.profile.education.field_of_study, "Computer Science");
    }

    #[rstest]
    fn wizard_stays_on_step_with_errors(mut complete_form: RegistrationForm) {
        complete_form.profile.phone.clear();
        let mut wizard = RegistrationWizard::new();
        *wizard.form_mut() = complete_form;
        wizard.advance().expect("account step is valid");
        let errors = wizard.advance().expect_err("phone missing");
        assert!(errors.contains_key("phone"));
        assert_eq!(wizard.step(), RegistrationStep::Personal);
        assert_eq!(wizard.back(), RegistrationStep::Account);
    }

    #[rstest]
    fn finish_before_last_step_is_refused(complete_form: RegistrationForm) {
        let mut wizard = RegistrationWizard::new();
        *wizard.form_mut() = complete_form;
        assert!(wizard.finish().is_err());
    }

    #[test]
    fn skills_csv_is_trimmed_and_filtered() {
        let mut profile = CandidateProfile::default();
        profile.set_skills_from_csv(" Rust, ,SQL ,  ");
        assert_eq!(profile.skills, ["Rust", "SQL"]);
    }
}
