//! User-facing notices ("toasts").
//!
//! The engine reports outcomes through a [`Notifier`] so front ends decide how
//! to show them. [`NoticeLog`] collects notices in memory.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
  /// Neutral information, including no-op outcomes.
  Info,
  Success,
  Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
  pub level:   NoticeLevel,
  pub message: String,
}

impl Notice {
  pub fn info(message: impl Into<String>) -> Self {
    Self { level: NoticeLevel::Info, message: message.into() }
  }

  pub fn success(message: impl Into<String>) -> Self {
    Self { level: NoticeLevel::Success, message: message.into() }
  }

  pub fn error(message: impl Into<String>) -> Self {
    Self { level: NoticeLevel::Error, message: message.into() }
  }
}

pub trait Notifier: Send + Sync {
  fn notify(&self, notice: Notice);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
  fn notify(&self, notice: Notice) { (**self).notify(notice) }
}

/// A [`Notifier`] that keeps every notice it receives.
///
/// Cloning is cheap; clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct NoticeLog {
  notices: Arc<Mutex<Vec<Notice>>>,
}

impl NoticeLog {
  pub fn new() -> Self { Self::default() }

  pub fn notices(&self) -> Vec<Notice> {
    self
      .notices
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }

  /// Remove and return everything logged so far.
  pub fn drain(&self) -> Vec<Notice> {
    std::mem::take(
      &mut *self.notices.lock().unwrap_or_else(PoisonError::into_inner),
    )
  }
}

impl Notifier for NoticeLog {
  fn notify(&self, notice: Notice) {
    self
      .notices
      .lock()
      .unwrap_or_else(PoisonError::into_inner)
      .push(notice);
  }
}
