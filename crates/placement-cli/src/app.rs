//! Command handlers. Each one mounts the views it needs over the shared record
//! stores, performs its action, and returns what should be shown.

use std::{sync::Arc, time::Duration};

use anyhow::{Context as _, Result, anyhow, bail};
use chrono::NaiveDate;
use placement_core::{
  Error as CoreError,
  binder::ViewBinder,
  bus::NotificationBus,
  desk::{self, JobDraft},
  gateway::{MutationGateway, MutationOutcome},
  kv::KeyValueStore,
  notify::{Notice, NoticeLevel, Notifier},
  record::{Record, RecordId},
  report::PlacementReport,
  seed,
  status::{Action, CollectionKind},
  store::RecordStore,
  user::{Directory, Session, User},
};

use crate::{client::ApiClient, settings::ClientSettings};

// ─── Console notifier ─────────────────────────────────────────────────────────

/// Prints notices to stdout (errors to stderr) as they arrive.
#[derive(Debug, Clone, Copy, Default)]
pub struct Console;

impl Notifier for Console {
  fn notify(&self, notice: Notice) {
    match notice.level {
      NoticeLevel::Info => println!("  {}", notice.message),
      NoticeLevel::Success => println!("✓ {}", notice.message),
      NoticeLevel::Error => eprintln!("✗ {}", notice.message),
    }
  }
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level client state shared by every command.
pub struct App<N = Console> {
  settings:  ClientSettings,
  client:    ApiClient,
  session:   Session,
  directory: Directory,
  apps:      Arc<RecordStore>,
  jobs:      Arc<RecordStore>,
  notifier:  N,
}

impl<N> App<N>
where
  N: Notifier + Clone,
{
  pub fn new(
    settings: ClientSettings,
    kv: Arc<dyn KeyValueStore>,
    notifier: N,
  ) -> Result<Self> {
    let client = ApiClient::new(
      &settings.api_url,
      Duration::from_secs(settings.request_timeout_secs),
    )?;
    let bus = NotificationBus::new();
    let apps = Arc::new(RecordStore::new(
      CollectionKind::Applications,
      Arc::clone(&kv),
      bus.clone(),
      seed::applications(),
    ));
    let jobs = Arc::new(RecordStore::new(
      CollectionKind::Jobs,
      Arc::clone(&kv),
      bus,
      seed::jobs(),
    ));

    Ok(Self {
      settings,
      client,
      session: Session::new(kv),
      directory: Directory::new(seed::users()),
      apps,
      jobs,
      notifier,
    })
  }

  fn gateway(
    &self,
    kind: CollectionKind,
  ) -> MutationGateway<ApiClient, N> {
    MutationGateway::new(kind, self.client.clone(), self.notifier.clone())
      .with_policy(self.settings.terminal_policy)
  }

  fn require_user(&self) -> Result<User> {
    self
      .session
      .current()
      .ok_or_else(|| anyhow!("not logged in; run `placement login` first"))
  }

  // ── Session ───────────────────────────────────────────────────────────────

  pub fn login(&self, username: &str, password: &str) -> Result<User> {
    let user = self
      .session
      .login(&self.directory, username, password)
      .ok_or_else(|| anyhow!("invalid username or password"))?;
    self.notifier.notify(Notice::success(format!(
      "Logged in as {} ({})",
      user.name, user.role
    )));
    Ok(user)
  }

  pub fn logout(&self) {
    self.session.logout();
    self.notifier.notify(Notice::info("Logged out"));
  }

  pub fn whoami(&self) -> Option<User> { self.session.current() }

  // ── Jobs ──────────────────────────────────────────────────────────────────

  /// The locally stored jobs, optionally filtered by title or company.
  pub fn jobs(&self, search: Option<&str>) -> Vec<Record> {
    let view = ViewBinder::mount(Arc::clone(&self.jobs));
    let all = view.snapshot();
    desk::search_jobs(&all, search.unwrap_or_default())
      .into_iter()
      .cloned()
      .collect()
  }

  /// Jobs as listed by the API. A failed fetch is reported and shows as an
  /// empty list.
  pub async fn posted_jobs(&self) -> Vec<Record> {
    let view = ViewBinder::detached(CollectionKind::Jobs);
    let handle = view.handle();
    match self.client.list_jobs().await {
      Ok(jobs) => {
        handle.seed(jobs);
      }
      Err(e) => {
        tracing::warn!(error = %e, "could not fetch posted jobs");
        self.notifier.notify(Notice::error("Could not load jobs"));
        view.seed_failed(e.to_string());
      }
    }
    view.snapshot()
  }

  pub async fn accept_job(&self, id: &str) -> Result<MutationOutcome> {
    let user = self.require_user()?;
    if !user.can_review() {
      bail!("only placement officers can accept jobs");
    }
    self.mutate(&self.jobs, id, Action::Accept, &user).await
  }

  pub fn post_job(&self, draft: JobDraft, today: NaiveDate) -> Result<Record> {
    let user = self.require_user()?;
    if !user.can_post_jobs() {
      bail!("only employers can post jobs");
    }
    let job = desk::new_job(&user, draft, today);
    ViewBinder::mount(Arc::clone(&self.jobs)).append(job.clone())?;
    self.notifier.notify(Notice::success("Job posted"));
    Ok(job)
  }

  // ── Applications ──────────────────────────────────────────────────────────

  /// Apply to `job_id`. Returns `None` when the student has already applied.
  pub fn apply(&self, job_id: &str, today: NaiveDate) -> Result<Option<Record>> {
    let user = self.require_user()?;
    if !user.can_apply() {
      bail!("only students can apply to jobs");
    }

    let job_id = RecordId::from(job_id);
    if ViewBinder::mount(Arc::clone(&self.jobs)).get(&job_id).is_none() {
      bail!("no job with id {job_id}");
    }

    let view = ViewBinder::mount(Arc::clone(&self.apps));
    match desk::new_application(&view.snapshot(), &job_id, &user, today) {
      Ok(app) => {
        view.append(app.clone())?;
        self.notifier.notify(Notice::success("Application submitted"));
        Ok(Some(app))
      }
      Err(CoreError::AlreadyApplied(_)) => {
        self
          .notifier
          .notify(Notice::info("You have already applied to this job"));
        Ok(None)
      }
      Err(e) => Err(e).context("creating application"),
    }
  }

  /// The applications the logged-in user may see.
  pub fn applications(&self) -> Result<Vec<Record>> {
    let user = self.require_user()?;
    let apps = ViewBinder::mount(Arc::clone(&self.apps)).snapshot();
    let jobs = ViewBinder::mount(Arc::clone(&self.jobs)).snapshot();
    Ok(
      desk::visible_applications(&user, &apps, &jobs)
        .into_iter()
        .cloned()
        .collect(),
    )
  }

  pub async fn review_application(
    &self,
    id: &str,
    action: Action,
  ) -> Result<MutationOutcome> {
    let user = self.require_user()?;
    if !user.can_review() {
      bail!("only placement officers can review applications");
    }
    self.mutate(&self.apps, id, action, &user).await
  }

  // ── Reports ───────────────────────────────────────────────────────────────

  pub fn report(&self) -> Result<PlacementReport> {
    let user = self.require_user()?;
    if !user.can_view_reports() {
      bail!("only officers and admins can view reports");
    }
    let apps = ViewBinder::mount(Arc::clone(&self.apps)).snapshot();
    let jobs = ViewBinder::mount(Arc::clone(&self.jobs)).snapshot();
    Ok(PlacementReport::build(
      &seed::students(),
      &seed::employers(),
      &jobs,
      &apps,
    ))
  }

  // ── Shared mutation path ──────────────────────────────────────────────────

  async fn mutate(
    &self,
    store: &Arc<RecordStore>,
    id: &str,
    action: Action,
    user: &User,
  ) -> Result<MutationOutcome> {
    let kind = store.kind();
    let view = ViewBinder::mount(Arc::clone(store));
    let entity = view
      .get(&RecordId::from(id))
      .ok_or_else(|| anyhow!("no {} with id {id}", kind.noun().to_lowercase()))?;

    // The view may be gone by the time the response lands; the handle then
    // drops the result instead of writing it.
    let handle = view.handle();
    let outcome = self.gateway(kind).mutate(&entity, action, &user.actor_id()).await;
    if outcome.changed() {
      handle.apply_update(outcome.record().clone());
    }
    Ok(outcome)
  }
}

// ─── Rendering ────────────────────────────────────────────────────────────────

/// One line per record, shaped for its collection.
pub fn render(kind: CollectionKind, record: &Record) -> String {
  let field = |key: &str| record.get_str(key).unwrap_or("-");
  let id = record.id.as_str();
  let status = record.status().map_or("-", |s| s.as_str());
  match kind {
    CollectionKind::Jobs => format!(
      "{id:<12} {status:<10} {} at {} ({})",
      field("title"),
      field("company"),
      field("location"),
    ),
    CollectionKind::Applications => format!(
      "{id:<12} {status:<10} job {} by {} on {}",
      field("jobId"),
      field("studentId"),
      field("appliedDate"),
    ),
  }
}

#[cfg(test)]
mod tests {
  use axum::{Json, Router, routing::get};
  use placement_core::{
    kv::MemoryKv,
    notify::NoticeLog,
    status::{Status, TerminalPolicy},
  };
  use serde_json::json;

  use super::*;
  use crate::client::tests::{closed_url, serve};

  fn today() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 12, 3).unwrap() }

  async fn offline_app() -> (App<NoticeLog>, NoticeLog) {
    app_at(closed_url().await).await
  }

  async fn app_at(api_url: String) -> (App<NoticeLog>, NoticeLog) {
    let settings = ClientSettings {
      api_url,
      request_timeout_secs: 5,
      ..ClientSettings::default()
    };
    let log = NoticeLog::new();
    let app = App::new(settings, Arc::new(MemoryKv::new()), log.clone()).unwrap();
    (app, log)
  }

  #[tokio::test]
  async fn commands_require_login() {
    let (app, _) = offline_app().await;
    assert!(app.applications().is_err());
    assert!(app.apply("job1", today()).is_err());
  }

  #[tokio::test]
  async fn login_and_logout() {
    let (app, log) = offline_app().await;
    assert!(app.login("officer", "nope").is_err());

    let user = app.login("officer", "officer123").unwrap();
    assert_eq!(app.whoami().map(|u| u.id), Some(user.id));

    app.logout();
    assert!(app.whoami().is_none());
    assert_eq!(log.notices().last(), Some(&Notice::info("Logged out")));
  }

  #[tokio::test]
  async fn student_applies_once() {
    let (app, log) = offline_app().await;
    app.login("vijay", "vijay123").unwrap();
    log.drain();

    let created = app.apply("job3", today()).unwrap();
    assert!(created.is_some());
    assert!(app.apply("job3", today()).unwrap().is_none());

    let mine = app.applications().unwrap();
    assert_eq!(mine.len(), 3);
    assert_eq!(log.drain(), vec![
      Notice::success("Application submitted"),
      Notice::info("You have already applied to this job"),
    ]);
  }

  #[tokio::test]
  async fn applying_to_unknown_job_fails() {
    let (app, _) = offline_app().await;
    app.login("vijay", "vijay123").unwrap();
    assert!(app.apply("job99", today()).is_err());
  }

  #[tokio::test]
  async fn officer_review_falls_back_locally_and_persists() {
    let (app, log) = offline_app().await;
    app.login("officer", "officer123").unwrap();
    log.drain();

    let outcome = app.review_application("app1", Action::Accept).await.unwrap();
    assert!(outcome.is_degraded());
    assert_eq!(log.drain(), vec![Notice::success(
      "Application accepted (local)"
    )]);

    let app1 = app
      .applications()
      .unwrap()
      .into_iter()
      .find(|a| a.id.as_str() == "app1")
      .unwrap();
    assert_eq!(app1.status().map(Status::as_str), Some("accepted"));
    assert_eq!(app1.get_str("jobId"), Some("job1"));

    // Locked by default: the accepted application cannot be rejected.
    let refused = app.review_application("app1", Action::Reject).await.unwrap();
    assert!(!refused.changed());
  }

  #[tokio::test]
  async fn reversible_policy_lets_officer_reverse() {
    let settings = ClientSettings {
      api_url: closed_url().await,
      terminal_policy: TerminalPolicy::Reversible,
      ..ClientSettings::default()
    };
    let app =
      App::new(settings, Arc::new(MemoryKv::new()), NoticeLog::new()).unwrap();
    app.login("officer", "officer123").unwrap();

    let outcome = app.review_application("app5", Action::Reject).await.unwrap();
    assert_eq!(outcome.record().status().map(Status::as_str), Some("rejected"));
  }

  #[tokio::test]
  async fn students_cannot_review() {
    let (app, _) = offline_app().await;
    app.login("vijay", "vijay123").unwrap();
    assert!(app.review_application("app1", Action::Accept).await.is_err());
    assert!(app.accept_job("job1").await.is_err());
  }

  #[tokio::test]
  async fn officer_accepts_job() {
    let (app, _) = offline_app().await;
    app.login("officer", "officer123").unwrap();

    app.accept_job("job2").await.unwrap();

    let job2 = app
      .jobs(Some("data"))
      .into_iter()
      .next()
      .unwrap();
    assert_eq!(job2.status().map(Status::as_str), Some("accepted"));
  }

  #[tokio::test]
  async fn employer_posts_job() {
    let (app, _) = offline_app().await;
    app.login("employer", "employer123").unwrap();

    let draft = JobDraft {
      title: "Backend Developer".into(),
      location: "Pune".into(),
      kind: "Full-time".into(),
      ..JobDraft::default()
    };
    let job = app.post_job(draft, today()).unwrap();

    assert_eq!(app.jobs(None).len(), 5);
    assert_eq!(app.jobs(Some("backend")), vec![job]);
  }

  #[tokio::test]
  async fn posted_jobs_failure_shows_empty_list() {
    let (app, log) = offline_app().await;

    assert!(app.posted_jobs().await.is_empty());
    assert_eq!(log.notices(), vec![Notice::error("Could not load jobs")]);
  }

  #[tokio::test]
  async fn posted_jobs_come_from_the_api() {
    let router = Router::new().route(
      "/api/jobs",
      get(|| async { Json(json!([{ "_id": "remote1", "title": "SRE" }])) }),
    );
    let (app, log) = app_at(serve(router).await).await;

    let jobs = app.posted_jobs().await;

    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].id.as_str(), "remote1");
    assert!(log.notices().is_empty());
  }

  #[tokio::test]
  async fn report_is_for_officers() {
    let (app, _) = offline_app().await;
    app.login("vijay", "vijay123").unwrap();
    assert!(app.report().is_err());

    app.login("admin", "admin123").unwrap();
    let report = app.report().unwrap();
    assert_eq!(report.students, 3);
    assert_eq!(report.employers, 2);
    assert_eq!(report.active_jobs, 4);
    assert_eq!(report.placement_rate_display(), "33.3%");
  }

  #[test]
  fn render_lines() {
    let jobs = seed::jobs();
    assert_eq!(
      render(CollectionKind::Jobs, &jobs[0]),
      "job1         active     Software Engineer at Tech Corp (Remote)"
    );
    let apps = seed::applications();
    assert_eq!(
      render(CollectionKind::Applications, &apps[0]),
      "app1         pending    job job1 by student1 on 2024-11-21"
    );
  }
}
