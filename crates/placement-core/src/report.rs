//! Placement statistics over the current collections.

use std::{collections::HashSet, fmt};

use serde::Serialize;

use crate::{record::Record, status::Status};

/// Application counts by review state. Statuses outside the four known
/// states are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
  pub pending:  usize,
  pub reviewed: usize,
  pub accepted: usize,
  pub rejected: usize,
}

impl StatusSummary {
  pub fn of(applications: &[Record]) -> Self {
    let mut summary = Self::default();
    for status in applications.iter().filter_map(Record::status) {
      match status.as_str() {
        Status::PENDING => summary.pending += 1,
        Status::REVIEWED => summary.reviewed += 1,
        Status::ACCEPTED | Status::HIRED => summary.accepted += 1,
        Status::REJECTED => summary.rejected += 1,
        _ => {}
      }
    }
    summary
  }

  pub fn total(&self) -> usize {
    self.pending + self.reviewed + self.accepted + self.rejected
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacementReport {
  pub students:          usize,
  /// Students with at least one application.
  pub active_applicants: usize,
  pub applications:      StatusSummary,
  pub employers:         usize,
  pub jobs:              usize,
  /// Jobs still open (`active`).
  pub active_jobs:       usize,
  /// Accepted applications per student, in percent.
  pub placement_rate:    f64,
}

impl PlacementReport {
  pub fn build(
    students: &[Record],
    employers: &[Record],
    jobs: &[Record],
    applications: &[Record],
  ) -> Self {
    let summary = StatusSummary::of(applications);
    let active_applicants = applications
      .iter()
      .filter_map(|app| app.get_str("studentId"))
      .collect::<HashSet<_>>()
      .len();
    let active_jobs = jobs
      .iter()
      .filter(|job| job.status().map(Status::as_str) == Some(Status::ACTIVE))
      .count();

    Self {
      students: students.len(),
      active_applicants,
      applications: summary,
      employers: employers.len(),
      jobs: jobs.len(),
      active_jobs,
      placement_rate: placement_rate(summary.accepted, students.len()),
    }
  }

  /// The rate rounded to one decimal, as shown to users.
  pub fn placement_rate_display(&self) -> String {
    format!("{:.1}%", self.placement_rate)
  }
}

/// Zero when there are no students.
pub fn placement_rate(accepted: usize, students: usize) -> f64 {
  if students == 0 {
    return 0.0;
  }
  accepted as f64 / students as f64 * 100.0
}

impl fmt::Display for PlacementReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let StatusSummary { pending, reviewed, accepted, rejected } =
      self.applications;
    writeln!(f, "students:          {}", self.students)?;
    writeln!(f, "active applicants: {}", self.active_applicants)?;
    writeln!(f, "employers:         {}", self.employers)?;
    writeln!(
      f,
      "jobs:              {} ({} active)",
      self.jobs, self.active_jobs
    )?;
    writeln!(
      f,
      "applications:      {} (pending {pending}, reviewed {reviewed}, \
       accepted {accepted}, rejected {rejected})",
      self.applications.total(),
    )?;
    write!(f, "placement rate:    {}", self.placement_rate_display())
  }
}
