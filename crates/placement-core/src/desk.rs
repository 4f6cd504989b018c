//! Creating and finding records on behalf of a user.
//!
//! These build new records only; appending them to a view and persisting the
//! result is the binder's job.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  record::{Record, RecordId},
  status::{CollectionKind, Status},
  user::{Role, User},
};

const DEFAULT_RESUME: &str = "resume.pdf";
const DEFAULT_COVER_LETTER: &str = "Application submitted";

fn fresh_id(prefix: &str) -> RecordId {
  RecordId::new(format!("{prefix}-{}", Uuid::new_v4().simple()))
}

fn date_string(date: NaiveDate) -> String { date.format("%Y-%m-%d").to_string() }

/// Build a pending application by `student` for `job_id`.
///
/// Refuses when `existing` already holds an application with the same job and
/// student.
pub fn new_application(
  existing: &[Record],
  job_id: &RecordId,
  student: &User,
  today: NaiveDate,
) -> Result<Record> {
  let student_id = student.actor_id();
  let duplicate = existing.iter().any(|app| {
    app.get_str("jobId") == Some(job_id.as_str())
      && app.get_str("studentId") == Some(student_id.as_str())
  });
  if duplicate {
    return Err(Error::AlreadyApplied(job_id.clone()));
  }

  Ok(
    Record::new(fresh_id("app"))
      .with_status(Status::PENDING)
      .with_field("jobId", job_id.as_str())
      .with_field("studentId", student_id.as_str())
      .with_field("appliedDate", date_string(today))
      .with_field("resume", DEFAULT_RESUME)
      .with_field("coverLetter", DEFAULT_COVER_LETTER),
  )
}

/// Fields an employer fills in when posting a job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDraft {
  pub title:        String,
  pub company:      Option<String>,
  pub location:     String,
  pub salary:       Option<String>,
  #[serde(rename = "type")]
  pub kind:         String,
  pub description:  Option<String>,
  pub requirements: Option<String>,
}

/// Build an active job posted by `employer`. The company defaults to the
/// employer's own.
pub fn new_job(employer: &User, draft: JobDraft, today: NaiveDate) -> Record {
  let JobDraft {
    title,
    company,
    location,
    salary,
    kind,
    description,
    requirements,
  } = draft;

  let company = company
    .or_else(|| employer.company.clone())
    .unwrap_or_else(|| employer.name.clone());

  let mut job = Record::new(fresh_id("job"))
    .with_status(CollectionKind::Jobs.default_status().as_str())
    .with_field("title", title)
    .with_field("company", company)
    .with_field("location", location)
    .with_field("type", kind)
    .with_field("postedBy", employer.actor_id().as_str())
    .with_field("postedDate", date_string(today));

  for (key, value) in [
    ("salary", salary),
    ("description", description),
    ("requirements", requirements),
  ] {
    if let Some(value) = value {
      job = job.with_field(key, value);
    }
  }
  job
}

/// Jobs whose title or company contains `term`, ignoring case. An empty term
/// matches everything.
pub fn search_jobs<'a>(jobs: &'a [Record], term: &str) -> Vec<&'a Record> {
  let needle = term.trim().to_lowercase();
  jobs
    .iter()
    .filter(|job| {
      needle.is_empty()
        || ["title", "company"].iter().any(|field| {
          job
            .get_str(field)
            .is_some_and(|v| v.to_lowercase().contains(&needle))
        })
    })
    .collect()
}

/// The applications `user` gets to see: students their own, employers those
/// for jobs they posted, officers and admins all of them.
pub fn visible_applications<'a>(
  user: &User,
  applications: &'a [Record],
  jobs: &[Record],
) -> Vec<&'a Record> {
  let me = user.actor_id();
  match user.role {
    Role::Student => applications
      .iter()
      .filter(|app| app.get_str("studentId") == Some(me.as_str()))
      .collect(),
    Role::Employer => {
      let mine: HashSet<&str> = jobs
        .iter()
        .filter(|job| job.get_str("postedBy") == Some(me.as_str()))
        .map(|job| job.id.as_str())
        .collect();
      applications
        .iter()
        .filter(|app| app.get_str("jobId").is_some_and(|id| mine.contains(id)))
        .collect()
    }
    Role::Officer | Role::Admin => applications.iter().collect(),
  }
}
